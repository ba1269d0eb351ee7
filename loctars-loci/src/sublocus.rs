use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use loctars_core::models::{GffLine, Segment, Strand, Transcript};
use loctars_overlaprs::is_intersecting;
use loctars_scoring::PickConfig;

use crate::container::TranscriptPool;
use crate::errors::{LociError, LociResult};
use crate::excluded::Excluded;
use crate::monosublocus::Monosublocus;
use crate::picking::select_winners;
use crate::printing::{container_line, metrics_row, scores_row, transcript_lines};
use crate::scores::{ScoreTable, score_pool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoringStage {
    Pending,
    MetricsCalculated,
    ScoresCalculated,
}

///
/// A cluster of strictly compatible transcripts: either all monoexonic and
/// overlapping, or all multiexonic and linked by shared junctions.
///
#[derive(Debug, Clone)]
pub struct Sublocus {
    id: String,
    pub parent: Option<String>,
    /// Position among the subloci of the parent superlocus.
    ordinal: Option<usize>,
    pool: TranscriptPool,
    monoexonic: bool,
    stage: ScoringStage,
    scores: ScoreTable,
    failed: BTreeSet<String>,
    monosubloci: Option<Vec<Monosublocus>>,
}

impl Sublocus {
    pub fn new(transcript: Transcript) -> LociResult<Self> {
        let monoexonic = transcript.monoexonic();
        let mut sublocus = Sublocus {
            id: String::new(),
            parent: None,
            ordinal: None,
            pool: TranscriptPool::new(),
            monoexonic,
            stage: ScoringStage::Pending,
            scores: ScoreTable::new(),
            failed: BTreeSet::new(),
            monosubloci: None,
        };
        sublocus.add(transcript)?;
        Ok(sublocus)
    }

    ///
    /// Add a transcript; mixing monoexonic and multiexonic transcripts is an error.
    /// Any previously computed metric, score or monosublocus is discarded.
    ///
    pub fn add(&mut self, transcript: Transcript) -> LociResult<()> {
        if !self.pool.is_empty() && transcript.monoexonic() != self.monoexonic {
            return Err(LociError::Incompatible {
                container: self.id.clone(),
                transcript: transcript.id,
            });
        }
        let tid = transcript.id.clone();
        self.pool.add(&self.id, transcript)?;
        self.refresh_id();
        self.stage = ScoringStage::Pending;
        self.scores.clear();
        self.failed.clear();
        self.monosubloci = None;
        debug!("Added {} to {}", tid, self.id);
        Ok(())
    }

    fn refresh_id(&mut self) {
        let mut id = format!(
            "sublocus:{}{}:{}-{}",
            self.pool.chrom(),
            self.pool.strand(),
            self.pool.start(),
            self.pool.end()
        );
        if let Some(ordinal) = self.ordinal {
            id.push_str(&format!(".{}", ordinal));
        }
        self.id = id;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    ///
    /// Number the sublocus within its superlocus. Two subloci of one region
    /// can share a span, so the number keeps their ids apart.
    ///
    pub fn set_ordinal(&mut self, ordinal: usize) {
        self.ordinal = Some(ordinal);
        self.refresh_id();
    }

    pub fn chrom(&self) -> &str {
        self.pool.chrom()
    }

    pub fn start(&self) -> u32 {
        self.pool.start()
    }

    pub fn end(&self) -> u32 {
        self.pool.end()
    }

    pub fn strand(&self) -> Strand {
        self.pool.strand()
    }

    pub fn span(&self) -> Segment {
        self.pool.span()
    }

    pub fn monoexonic(&self) -> bool {
        self.monoexonic
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stage(&self) -> ScoringStage {
        self.stage
    }

    pub fn get(&self, tid: &str) -> Option<&Transcript> {
        self.pool.get(tid)
    }

    pub fn transcripts(&self) -> &BTreeMap<String, Transcript> {
        self.pool.transcripts()
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    /// Transcripts that failed the requirements, purged or not.
    pub fn failed(&self) -> &BTreeSet<String> {
        &self.failed
    }

    pub fn monosubloci(&self) -> Option<&[Monosublocus]> {
        self.monosubloci.as_deref()
    }

    pub fn calculate_metrics(&mut self) {
        if self.stage >= ScoringStage::MetricsCalculated {
            return;
        }
        self.pool.calculate_metrics();
        self.stage = ScoringStage::MetricsCalculated;
    }

    ///
    /// Score every transcript. Purged transcripts are moved into `excluded`.
    /// Repeated calls are no-ops until the composition changes.
    ///
    pub fn calculate_scores(&mut self, config: &PickConfig, excluded: &mut Excluded) -> LociResult<()> {
        if self.stage >= ScoringStage::ScoresCalculated {
            return Ok(());
        }
        if self.pool.is_empty() {
            return Err(LociError::Empty(self.id.clone()));
        }
        debug!("Calculating scores for {}", self.id);

        let outcome = score_pool(&mut self.pool, config, config.run_options.purge);
        for transcript in outcome.purged {
            excluded.add(transcript)?;
        }
        if self.pool.is_empty() {
            warn!("No transcripts pass the muster for {}", self.id);
        }
        self.scores = outcome.scores;
        self.failed = outcome.failed;
        self.stage = ScoringStage::ScoresCalculated;
        Ok(())
    }

    ///
    /// Use externally supplied scores instead of computing them. Transcripts
    /// missing from `scores` get 0.
    ///
    pub fn load_scores(&mut self, scores: &BTreeMap<String, f64>) {
        for transcript in self.pool.iter_mut() {
            transcript.score = Some(scores.get(&transcript.id).copied().unwrap_or(0.0));
        }
        self.scores.clear();
        self.failed.clear();
        self.monosubloci = None;
        self.stage = ScoringStage::ScoresCalculated;
    }

    ///
    /// Decompose the sublocus into non-intersecting winners.
    ///
    pub fn define_monosubloci(
        &mut self,
        config: &PickConfig,
        excluded: &mut Excluded,
    ) -> LociResult<&[Monosublocus]> {
        if self.monosubloci.is_none() {
            self.calculate_scores(config, excluded)?;
            debug!("Defining monosubloci for {}", self.id);

            let winners = select_winners(
                &self.id,
                self.pool.transcripts(),
                is_intersecting,
                config.run_options.tie_break,
                config.run_options.purge,
            )?;
            let monosubloci = winners
                .iter()
                .filter_map(|tid| self.pool.get(tid))
                .map(|t| Monosublocus::new(t.clone()))
                .collect();
            self.monosubloci = Some(monosubloci);
            debug!("Defined monosubloci for {}", self.id);
        }
        Ok(self.monosubloci.as_deref().unwrap_or_default())
    }

    pub fn metrics_rows(&self) -> Vec<Vec<String>> {
        self.pool
            .sorted()
            .into_iter()
            .map(|t| metrics_row(t, &self.id))
            .collect()
    }

    pub fn score_rows(&self, config: &PickConfig) -> Vec<Vec<String>> {
        self.pool
            .sorted()
            .into_iter()
            .filter(|t| self.scores.contains_key(&t.id))
            .map(|t| scores_row(t, &self.id, self.scores.get(&t.id), config))
            .collect()
    }

    pub fn gff_lines(&self, source: &str, print_cds: bool) -> Vec<GffLine> {
        let mut lines = vec![container_line(
            "sublocus",
            &self.id,
            self.parent.as_deref(),
            (self.chrom(), self.start(), self.end(), self.strand()),
            source,
        )];
        for transcript in self.pool.sorted() {
            lines.extend(transcript_lines(transcript, &self.id, source, print_cds, &[]));
        }
        lines
    }
}
