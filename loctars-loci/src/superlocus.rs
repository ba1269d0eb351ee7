use std::collections::BTreeMap;
use std::fmt::{self, Display};

use log::{debug, warn};

use loctars_core::models::{GffLine, Segment, Strand, Transcript};
use loctars_overlaprs::{OverlapGraph, find_communities, is_intersecting, overlap};
use loctars_scoring::PickConfig;

use crate::errors::{LociError, LociResult};
use crate::excluded::Excluded;
use crate::holder::MonosublocusHolder;
use crate::locus::Locus;
use crate::monosublocus::Monosublocus;
use crate::printing::{BLOCK_SEPARATOR, container_line};
use crate::sublocus::Sublocus;

///
/// Decomposition stage of a superlocus. Stages only move forward.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Raw,
    SublociDefined,
    MonosublociDefined,
    LociDefined,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::SublociDefined => "subloci",
            Stage::MonosublociDefined => "monosubloci",
            Stage::LociDefined => "loci",
        }
    }
}

/// Granularity of the structural output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Subloci,
    Monosubloci,
    Loci,
}

impl Level {
    fn required_stage(&self) -> Stage {
        match self {
            Level::Subloci => Stage::SublociDefined,
            Level::Monosubloci => Stage::MonosublociDefined,
            Level::Loci => Stage::LociDefined,
        }
    }
}

///
/// Root container for one genomic region.
///
/// The transcripts added to a superlocus are never modified by the
/// decomposition: every stage works on copies and stores its own result,
/// so each stage is computed at most once.
///
#[derive(Debug, Clone)]
pub struct Superlocus {
    chrom: String,
    start: u32,
    end: u32,
    strand: Strand,
    stranded: bool,
    transcripts: BTreeMap<String, Transcript>,
    stage: Stage,
    subloci: Vec<Sublocus>,
    monosubloci: Vec<Monosublocus>,
    loci: Vec<Locus>,
    excluded: Excluded,
}

impl Superlocus {
    pub fn new(transcript: Transcript, stranded: bool) -> LociResult<Self> {
        let mut superlocus = Superlocus {
            chrom: transcript.chrom.clone(),
            start: 0,
            end: 0,
            strand: transcript.strand,
            stranded,
            transcripts: BTreeMap::new(),
            stage: Stage::Raw,
            subloci: Vec::new(),
            monosubloci: Vec::new(),
            loci: Vec::new(),
            excluded: Excluded::new(),
        };
        superlocus.add_transcript(transcript)?;
        Ok(superlocus)
    }

    ///
    /// Add a transcript, finalizing it. Any decomposition computed so far
    /// is discarded.
    ///
    pub fn add_transcript(&mut self, mut transcript: Transcript) -> LociResult<()> {
        transcript.finalize()?;
        let id = self.id();
        if self.transcripts.contains_key(&transcript.id) {
            return Err(LociError::DuplicateTranscript {
                container: id,
                transcript: transcript.id,
            });
        }
        if transcript.chrom != self.chrom {
            return Err(LociError::ChromosomeMismatch {
                container: id,
                transcript: transcript.id,
                expected: self.chrom.clone(),
                found: transcript.chrom,
            });
        }
        if self.stranded && transcript.strand != self.strand {
            return Err(LociError::StrandMismatch {
                container: id,
                transcript: transcript.id,
                found: transcript.strand.to_string(),
            });
        }

        if self.transcripts.is_empty() {
            self.start = transcript.start;
            self.end = transcript.end;
        } else {
            self.start = self.start.min(transcript.start);
            self.end = self.end.max(transcript.end);
            if transcript.strand != self.strand {
                self.strand = Strand::Unknown;
            }
        }
        self.transcripts.insert(transcript.id.clone(), transcript);

        if self.stage > Stage::Raw {
            debug!("{} changed after decomposition, resetting", self.id());
            self.reset();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.stage = Stage::Raw;
        self.subloci.clear();
        self.monosubloci.clear();
        self.loci.clear();
        self.excluded = Excluded::new();
    }

    pub fn id(&self) -> String {
        format!(
            "superlocus:{}{}:{}-{}",
            self.chrom, self.strand, self.start, self.end
        )
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn span(&self) -> Segment {
        (self.start, self.end)
    }

    pub fn stranded(&self) -> bool {
        self.stranded
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn transcripts(&self) -> &BTreeMap<String, Transcript> {
        &self.transcripts
    }

    pub fn subloci(&self) -> &[Sublocus] {
        &self.subloci
    }

    pub fn monosubloci(&self) -> &[Monosublocus] {
        &self.monosubloci
    }

    pub fn loci(&self) -> &[Locus] {
        &self.loci
    }

    pub fn loci_mut(&mut self) -> &mut Vec<Locus> {
        &mut self.loci
    }

    pub fn excluded(&self) -> &Excluded {
        &self.excluded
    }

    ///
    /// True if the transcript belongs to the region: same chromosome,
    /// overlapping span and, for stranded superloci, same strand.
    ///
    pub fn in_locus(&self, transcript: &Transcript) -> bool {
        if self.stranded && transcript.strand != self.strand {
            return false;
        }
        self.chrom == transcript.chrom && overlap(self.span(), transcript.span()) > 0
    }

    ///
    /// Partition an unstranded superlocus into stranded ones.
    ///
    /// Transcripts are grouped by strand, sorted by position, and chained
    /// while each one overlaps the region grown so far. A stranded
    /// superlocus is returned as is.
    ///
    pub fn split_strands(self) -> LociResult<Vec<Superlocus>> {
        if self.stranded {
            return Ok(vec![self]);
        }

        let mut by_strand: BTreeMap<Strand, Vec<Transcript>> = BTreeMap::new();
        for transcript in self.transcripts.into_values() {
            by_strand.entry(transcript.strand).or_default().push(transcript);
        }

        let mut split: Vec<Superlocus> = Vec::new();
        for (_, mut transcripts) in by_strand {
            transcripts.sort_by(|a, b| a.position_key().cmp(&b.position_key()));
            let mut current: Option<Superlocus> = None;
            for transcript in transcripts {
                let extends = current.as_ref().is_some_and(|s| s.in_locus(&transcript));
                match current.as_mut() {
                    Some(superlocus) if extends => superlocus.add_transcript(transcript)?,
                    _ => {
                        if let Some(done) = current.replace(Superlocus::new(transcript, true)?) {
                            split.push(done);
                        }
                    }
                }
            }
            split.extend(current);
        }

        split.sort_by_key(|s| (s.start, s.end, s.strand));
        Ok(split)
    }

    ///
    /// Cluster all transcripts with the strict intersection predicate; every
    /// community of the overlap graph becomes one sublocus.
    ///
    pub fn define_subloci(&mut self) -> LociResult<()> {
        if self.stage >= Stage::SublociDefined {
            return Ok(());
        }
        let id = self.id();
        if self.transcripts.is_empty() {
            return Err(LociError::Empty(id));
        }

        let graph = OverlapGraph::build(
            self.transcripts.iter().map(|(tid, t)| (tid.clone(), t)),
            is_intersecting,
        );
        let (_, communities) = find_communities(&graph);

        let mut subloci = Vec::with_capacity(communities.len());
        for community in communities {
            let mut members = community.iter().filter_map(|tid| self.transcripts.get(tid));
            let Some(first) = members.next() else {
                continue;
            };
            let mut sublocus = Sublocus::new(first.clone())?;
            for transcript in members {
                sublocus.add(transcript.clone())?;
            }
            sublocus.parent = Some(id.clone());
            subloci.push(sublocus);
        }
        subloci.sort_by_key(|s| (s.start(), s.end(), s.id().to_string()));
        for (n, sublocus) in subloci.iter_mut().enumerate() {
            sublocus.set_ordinal(n + 1);
        }
        debug!("Defined {} subloci for {}", subloci.len(), id);

        self.subloci = subloci;
        self.stage = Stage::SublociDefined;
        Ok(())
    }

    ///
    /// Decompose every sublocus into monosubloci. Transcripts purged while
    /// scoring end up in the excluded container.
    ///
    pub fn define_monosubloci(&mut self, config: &PickConfig) -> LociResult<()> {
        if self.stage >= Stage::MonosublociDefined {
            return Ok(());
        }
        self.define_subloci()?;
        let id = self.id();

        let mut monosubloci = Vec::new();
        for sublocus in self.subloci.iter_mut() {
            for monosublocus in sublocus.define_monosubloci(config, &mut self.excluded)? {
                let mut monosublocus = monosublocus.clone();
                monosublocus.parent = Some(id.clone());
                monosubloci.push(monosublocus);
            }
        }
        monosubloci.sort_by(|a, b| {
            a.transcript
                .position_key()
                .cmp(&b.transcript.position_key())
        });
        for (n, monosublocus) in monosubloci.iter_mut().enumerate() {
            monosublocus.set_ordinal(n + 1);
        }
        if !self.excluded.is_empty() {
            debug!("{} transcripts excluded from {}", self.excluded.len(), id);
        }

        self.monosubloci = monosubloci;
        self.stage = Stage::MonosublociDefined;
        Ok(())
    }

    ///
    /// Merge the monosubloci into the final loci.
    ///
    pub fn define_loci(&mut self, config: &PickConfig) -> LociResult<()> {
        if self.stage >= Stage::LociDefined {
            return Ok(());
        }
        self.define_monosubloci(config)?;
        let id = self.id();

        let mut loci = Vec::new();
        if self.monosubloci.is_empty() {
            warn!("No monosubloci left in {}", id);
        } else {
            let mut holder = MonosublocusHolder::new();
            for monosublocus in self.monosubloci.iter() {
                holder.add_monosublocus(monosublocus.clone())?;
            }
            loci = holder.define_loci(config)?;
            for locus in loci.iter_mut() {
                locus.parent = Some(id.clone());
            }
        }
        debug!("Defined {} loci for {}", loci.len(), id);

        self.loci = loci;
        self.stage = Stage::LociDefined;
        Ok(())
    }

    ///
    /// GFF3 block of the superlocus at the requested level, closed by `###`.
    /// An empty vector is returned when the level has nothing to print.
    ///
    pub fn format_gff(&self, level: Level, source: &str, print_cds: bool) -> LociResult<Vec<String>> {
        let required = level.required_stage();
        if self.stage < required {
            return Err(LociError::StageNotReached {
                container: self.id(),
                required: required.as_str(),
            });
        }

        let children: Vec<GffLine> = match level {
            Level::Subloci => self
                .subloci
                .iter()
                .flat_map(|s| s.gff_lines(source, print_cds))
                .collect(),
            Level::Monosubloci => self
                .monosubloci
                .iter()
                .flat_map(|m| m.gff_lines(source, print_cds))
                .collect(),
            Level::Loci => self
                .loci
                .iter()
                .flat_map(|l| l.gff_lines(source, print_cds))
                .collect(),
        };
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let header = container_line(
            "superlocus",
            &self.id(),
            None,
            (&self.chrom, self.start, self.end, self.strand),
            source,
        );
        let mut lines = vec![header.to_string()];
        lines.extend(children.iter().map(|line| line.to_string()));
        lines.push(BLOCK_SEPARATOR.to_string());
        Ok(lines)
    }

    /// Metrics of every sublocus transcript, followed by the excluded ones.
    pub fn sublocus_metrics_rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self.subloci.iter().flat_map(|s| s.metrics_rows()).collect();
        rows.extend(self.excluded.metrics_rows());
        rows
    }

    pub fn sublocus_score_rows(&self, config: &PickConfig) -> Vec<Vec<String>> {
        self.subloci
            .iter()
            .flat_map(|s| s.score_rows(config))
            .collect()
    }

    pub fn locus_metrics_rows(&self) -> Vec<Vec<String>> {
        self.loci.iter().map(|l| l.metrics_row()).collect()
    }

    pub fn locus_score_rows(&self, config: &PickConfig) -> Vec<Vec<String>> {
        self.loci.iter().map(|l| l.score_row(config)).collect()
    }
}

impl Display for Superlocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} transcripts)", self.id(), self.transcripts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn transcript(id: &str, strand: Strand, exons: Vec<Segment>) -> Transcript {
        Transcript::new(id, "chr1", strand, exons)
    }

    fn superlocus(transcripts: Vec<Transcript>, stranded: bool) -> Superlocus {
        let mut iter = transcripts.into_iter();
        let mut superlocus = Superlocus::new(iter.next().unwrap(), stranded).unwrap();
        for t in iter {
            superlocus.add_transcript(t).unwrap();
        }
        superlocus
    }

    #[fixture]
    fn config() -> PickConfig {
        r#"
[scoring.cdna_length]
rescaling = "max"

[scoring.exon_num]
rescaling = "max"
"#
        .parse()
        .unwrap()
    }

    #[rstest]
    fn test_split_strands() {
        let slocus = superlocus(
            vec![
                transcript("p1", Strand::Plus, vec![(100, 200), (301, 400)]),
                transcript("p2", Strand::Plus, vec![(350, 500), (601, 700)]),
                transcript("p3", Strand::Plus, vec![(900, 1000)]),
                transcript("m1", Strand::Minus, vec![(150, 250), (401, 450)]),
            ],
            false,
        );
        assert_eq!(slocus.strand(), Strand::Unknown);

        let split = slocus.split_strands().unwrap();
        let ids: Vec<String> = split.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec![
                "superlocus:chr1+:100-700",
                "superlocus:chr1-:150-450",
                "superlocus:chr1+:900-1000",
            ]
        );
        assert!(split.iter().all(|s| s.stranded()));
    }

    #[rstest]
    fn test_stranded_rejects_other_strand() {
        let mut slocus = superlocus(vec![transcript("p1", Strand::Plus, vec![(100, 200)])], true);
        let result = slocus.add_transcript(transcript("m1", Strand::Minus, vec![(150, 250)]));
        assert!(matches!(result, Err(LociError::StrandMismatch { .. })));
    }

    #[rstest]
    fn test_two_subloci_from_shared_junction() {
        // a and b share the (201, 300) junction; c shares none
        let mut slocus = superlocus(
            vec![
                transcript("a", Strand::Plus, vec![(101, 200), (301, 400)]),
                transcript("b", Strand::Plus, vec![(151, 200), (301, 450)]),
                transcript("c", Strand::Plus, vec![(101, 250), (351, 400)]),
            ],
            true,
        );
        slocus.define_subloci().unwrap();

        let members: Vec<Vec<&str>> = slocus
            .subloci()
            .iter()
            .map(|s| s.transcripts().keys().map(|k| k.as_str()).collect())
            .collect();
        assert_eq!(members, vec![vec!["c"], vec!["a", "b"]]);
        assert!(
            slocus
                .subloci()
                .iter()
                .all(|s| s.parent.as_deref() == Some("superlocus:chr1+:101-450"))
        );
    }

    #[rstest]
    fn test_stages_are_ordered_and_idempotent(config: PickConfig) {
        let mut slocus = superlocus(
            vec![
                transcript("a", Strand::Plus, vec![(101, 200), (301, 400)]),
                transcript("b", Strand::Plus, vec![(151, 200), (301, 450)]),
                transcript("c", Strand::Plus, vec![(101, 250), (351, 400)]),
            ],
            true,
        );
        assert!(matches!(
            slocus.format_gff(Level::Loci, "loctars", true),
            Err(LociError::StageNotReached { .. })
        ));

        slocus.define_loci(&config).unwrap();
        assert_eq!(slocus.stage(), Stage::LociDefined);
        let first: Vec<String> = slocus.loci().iter().map(|l| l.transcript.id.clone()).collect();
        slocus.define_loci(&config).unwrap();
        let second: Vec<String> = slocus.loci().iter().map(|l| l.transcript.id.clone()).collect();
        assert_eq!(first, second);
        // a and b tie on every metric and their exons overlap: the lowest id wins
        assert_eq!(first, vec!["a"]);

        let lines = slocus.format_gff(Level::Loci, "loctars", true).unwrap();
        assert!(lines[0].contains("\tsuperlocus\t"));
        assert!(lines[1].contains("\tgene\t"));
        assert_eq!(lines.last().map(|s| s.as_str()), Some("###"));

        let sublines = slocus.format_gff(Level::Subloci, "loctars", true).unwrap();
        assert_eq!(sublines.iter().filter(|l| l.contains("\tsublocus\t")).count(), 2);
        assert_eq!(slocus.sublocus_metrics_rows().len(), 3);
        assert_eq!(slocus.locus_score_rows(&config).len(), 1);
    }

    fn gff_ids(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|l| l.split('\t').nth(8))
            .filter_map(|attrs| attrs.split(';').find_map(|kv| kv.strip_prefix("ID=")))
            .map(|id| id.to_string())
            .collect()
    }

    #[rstest]
    #[case(Level::Subloci)]
    #[case(Level::Monosubloci)]
    #[case(Level::Loci)]
    fn test_ids_unique_within_level(config: PickConfig, #[case] level: Level) {
        // same span, one monoexonic and two multiexonic without a shared junction
        let mut slocus = superlocus(
            vec![
                transcript("mono", Strand::Plus, vec![(1, 300)]),
                transcript("multi1", Strand::Plus, vec![(1, 100), (201, 300)]),
                transcript("multi2", Strand::Plus, vec![(1, 50), (251, 300)]),
            ],
            true,
        );
        slocus.define_loci(&config).unwrap();
        assert_eq!(slocus.subloci().len(), 3);
        assert_eq!(slocus.monosubloci().len(), 3);

        let lines = slocus.format_gff(level, "loctars", true).unwrap();
        let ids = gff_ids(&lines);
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len(), "duplicate ids in {:?}", ids);
    }

    #[rstest]
    fn test_subloci_numbered_in_order(config: PickConfig) {
        let mut slocus = superlocus(
            vec![
                transcript("mono", Strand::Plus, vec![(1, 300)]),
                transcript("multi", Strand::Plus, vec![(1, 100), (201, 300)]),
            ],
            true,
        );
        slocus.define_monosubloci(&config).unwrap();
        let ids: Vec<&str> = slocus.subloci().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["sublocus:chr1+:1-300.1", "sublocus:chr1+:1-300.2"]);
        let ids: Vec<&str> = slocus.monosubloci().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["monosublocus:chr1+:1-300.1", "monosublocus:chr1+:1-300.2"]
        );
    }

    #[rstest]
    fn test_touching_exons_rejected() {
        let result = Superlocus::new(
            transcript("adjacent", Strand::Plus, vec![(1, 100), (101, 200)]),
            true,
        );
        assert!(matches!(result, Err(LociError::Transcript(_))));
    }

    #[rstest]
    fn test_adding_resets_stage(config: PickConfig) {
        let mut slocus = superlocus(
            vec![transcript("a", Strand::Plus, vec![(101, 200), (301, 400)])],
            true,
        );
        slocus.define_loci(&config).unwrap();
        slocus
            .add_transcript(transcript("b", Strand::Plus, vec![(151, 200), (301, 450)]))
            .unwrap();
        assert_eq!(slocus.stage(), Stage::Raw);
        assert!(slocus.loci().is_empty());
    }
}
