use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use loctars_core::models::{RelativeMetrics, Segment, Strand, Transcript};
use loctars_overlaprs::overlap;

use crate::errors::{LociError, LociResult};

///
/// Transcripts keyed by id, plus the aggregate geometry every container
/// needs to compute relative metrics: the union of exons, introns, CDS
/// introns and verified introns of its members.
///
#[derive(Debug, Clone, Default)]
pub struct TranscriptPool {
    chrom: String,
    start: u32,
    end: u32,
    strand: Strand,
    transcripts: BTreeMap<String, Transcript>,
    exons: BTreeSet<Segment>,
    introns: BTreeSet<Segment>,
    combined_cds_introns: BTreeSet<Segment>,
    verified_introns: BTreeSet<Segment>,
}

impl TranscriptPool {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Add a transcript, finalizing it first.
    ///
    /// # Arguments
    ///
    /// - container: name used in error messages
    /// - transcript: the transcript to move into the pool
    ///
    pub fn add(&mut self, container: &str, mut transcript: Transcript) -> LociResult<()> {
        transcript.finalize()?;
        if self.transcripts.contains_key(&transcript.id) {
            return Err(LociError::DuplicateTranscript {
                container: container.to_string(),
                transcript: transcript.id,
            });
        }

        if self.transcripts.is_empty() {
            self.chrom = transcript.chrom.clone();
            self.start = transcript.start;
            self.end = transcript.end;
            self.strand = transcript.strand;
        } else {
            if self.chrom != transcript.chrom {
                return Err(LociError::ChromosomeMismatch {
                    container: container.to_string(),
                    transcript: transcript.id,
                    expected: self.chrom.clone(),
                    found: transcript.chrom,
                });
            }
            self.start = self.start.min(transcript.start);
            self.end = self.end.max(transcript.end);
            if self.strand != transcript.strand {
                self.strand = Strand::Unknown;
            }
        }

        self.absorb(&transcript);
        self.transcripts.insert(transcript.id.clone(), transcript);
        Ok(())
    }

    fn absorb(&mut self, transcript: &Transcript) {
        self.exons.extend(transcript.exons.iter().copied());
        self.introns.extend(transcript.introns().iter().copied());
        self.combined_cds_introns
            .extend(transcript.combined_cds_introns().iter().copied());
        self.verified_introns.extend(
            transcript
                .verified_introns
                .intersection(transcript.introns())
                .copied(),
        );
    }

    ///
    /// Remove a transcript and rebuild the aggregates from the remaining members.
    ///
    pub fn remove(&mut self, tid: &str) -> Option<Transcript> {
        let removed = self.transcripts.remove(tid)?;

        self.exons.clear();
        self.introns.clear();
        self.combined_cds_introns.clear();
        self.verified_introns.clear();

        let members: Vec<Transcript> = std::mem::take(&mut self.transcripts).into_values().collect();
        let mut first = true;
        for transcript in members.iter() {
            if first {
                self.start = transcript.start;
                self.end = transcript.end;
                self.strand = transcript.strand;
                first = false;
            } else {
                self.start = self.start.min(transcript.start);
                self.end = self.end.max(transcript.end);
                if self.strand != transcript.strand {
                    self.strand = Strand::Unknown;
                }
            }
            self.absorb(transcript);
        }
        self.transcripts = members.into_iter().map(|t| (t.id.clone(), t)).collect();
        Some(removed)
    }

    pub fn get(&self, tid: &str) -> Option<&Transcript> {
        self.transcripts.get(tid)
    }

    pub fn get_mut(&mut self, tid: &str) -> Option<&mut Transcript> {
        self.transcripts.get_mut(tid)
    }

    pub fn contains(&self, tid: &str) -> bool {
        self.transcripts.contains_key(tid)
    }

    pub fn transcripts(&self) -> &BTreeMap<String, Transcript> {
        &self.transcripts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Transcript> {
        self.transcripts.values_mut()
    }

    /// Members sorted by position, then id.
    pub fn sorted(&self) -> Vec<&Transcript> {
        let mut members: Vec<&Transcript> = self.transcripts.values().collect();
        members.sort_by(|a, b| a.position_key().cmp(&b.position_key()));
        members
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
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

    pub fn exons(&self) -> &BTreeSet<Segment> {
        &self.exons
    }

    pub fn introns(&self) -> &BTreeSet<Segment> {
        &self.introns
    }

    pub fn combined_cds_introns(&self) -> &BTreeSet<Segment> {
        &self.combined_cds_introns
    }

    pub fn verified_introns(&self) -> &BTreeSet<Segment> {
        &self.verified_introns
    }

    ///
    /// Exons of `transcript` that look like retained CDS introns of the pool:
    /// non-CDS exons, downstream of the CDS start, that cover a whole CDS intron.
    ///
    pub fn find_retained_introns(&self, transcript: &Transcript) -> Vec<Segment> {
        let cds_start = transcript.combined_cds_start();
        transcript
            .exons
            .iter()
            .filter(|exon| !transcript.cds.contains(exon))
            .filter(|exon| match (cds_start, transcript.strand) {
                (None, _) => true,
                (Some(start), Strand::Minus) => exon.1 <= start,
                (Some(start), _) => exon.0 >= start,
            })
            .filter(|exon| {
                self.combined_cds_introns
                    .iter()
                    .any(|intron| overlap(**exon, *intron) >= (intron.1 - intron.0 + 1) as i64)
            })
            .copied()
            .collect()
    }

    fn relative_metrics(&self, transcript: &Transcript) -> RelativeMetrics {
        let fraction = |shared: usize, total: usize| {
            if total == 0 {
                0.0
            } else {
                shared as f64 / total as f64
            }
        };

        let shared_exons = transcript
            .exons
            .iter()
            .filter(|e| self.exons.contains(e))
            .count();
        let shared_introns = transcript.introns().intersection(&self.introns).count();
        let shared_cds_introns = transcript
            .combined_cds_introns()
            .intersection(&self.combined_cds_introns)
            .count();
        let shared_verified = transcript
            .verified_introns
            .intersection(transcript.introns())
            .filter(|i| self.verified_introns.contains(i))
            .count();

        let retained_introns = self.find_retained_introns(transcript);
        let retained_bases: u32 = retained_introns.iter().map(|(s, e)| e - s + 1).sum();

        RelativeMetrics {
            exon_fraction: fraction(shared_exons, self.exons.len()),
            intron_fraction: fraction(shared_introns, self.introns.len()),
            combined_cds_intron_fraction: fraction(
                shared_cds_introns,
                self.combined_cds_introns.len(),
            ),
            retained_fraction: fraction(retained_bases as usize, transcript.cdna_length() as usize),
            retained_introns,
            proportion_verified_introns_inlocus: fraction(
                shared_verified,
                self.verified_introns.len(),
            ),
        }
    }

    ///
    /// Recompute the relative metrics of every member against the current composition.
    ///
    pub fn calculate_metrics(&mut self) {
        let metrics: Vec<(String, RelativeMetrics)> = self
            .transcripts
            .values()
            .map(|t| (t.id.clone(), self.relative_metrics(t)))
            .collect();
        for (tid, computed) in metrics {
            debug!("Calculated metrics for {}", tid);
            if let Some(transcript) = self.transcripts.get_mut(&tid) {
                transcript.metrics = computed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn transcript(id: &str, exons: Vec<Segment>, cds: Vec<Segment>) -> Transcript {
        Transcript::new(id, "chr1", Strand::Plus, exons).with_cds(cds)
    }

    #[fixture]
    fn pool() -> TranscriptPool {
        let mut pool = TranscriptPool::new();
        pool.add(
            "test",
            transcript(
                "spliced",
                vec![(101, 200), (301, 400), (501, 600)],
                vec![(151, 200), (301, 400), (501, 550)],
            ),
        )
        .unwrap();
        pool.add(
            "test",
            transcript("retaining", vec![(101, 200), (301, 600)], vec![(151, 200), (301, 420)]),
        )
        .unwrap();
        pool
    }

    #[rstest]
    fn test_aggregates(pool: TranscriptPool) {
        assert_eq!(pool.span(), (101, 600));
        assert_eq!(pool.exons().len(), 4);
        assert_eq!(pool.introns().len(), 2);
        assert_eq!(pool.combined_cds_introns().len(), 2);
    }

    #[rstest]
    fn test_retained_intron(mut pool: TranscriptPool) {
        pool.calculate_metrics();
        let retaining = pool.get("retaining").unwrap();
        // (301, 600) is not a CDS segment and covers the CDS intron (401, 500)
        assert_eq!(retaining.metrics.retained_introns, vec![(301, 600)]);
        assert_eq!(retaining.metrics.retained_fraction, 300.0 / 400.0);
        assert_eq!(retaining.metrics.intron_fraction, 0.5);

        let spliced = pool.get("spliced").unwrap();
        assert!(spliced.metrics.retained_introns.is_empty());
        assert_eq!(spliced.metrics.intron_fraction, 1.0);
        assert_eq!(spliced.metrics.exon_fraction, 0.75);
    }

    #[rstest]
    fn test_remove_rebuilds_aggregates(mut pool: TranscriptPool) {
        let removed = pool.remove("spliced").unwrap();
        assert_eq!(removed.id, "spliced");
        assert_eq!(pool.introns().len(), 1);
        assert_eq!(pool.span(), (101, 600));
        assert!(pool.remove("spliced").is_none());
    }

    #[rstest]
    fn test_duplicate_and_chromosome(mut pool: TranscriptPool) {
        let duplicate = transcript("spliced", vec![(101, 200)], vec![]);
        assert!(matches!(
            pool.add("test", duplicate),
            Err(LociError::DuplicateTranscript { .. })
        ));
        let elsewhere = Transcript::new("other", "chr2", Strand::Plus, vec![(1, 10)]);
        assert!(matches!(
            pool.add("test", elsewhere),
            Err(LociError::ChromosomeMismatch { .. })
        ));
    }

    #[rstest]
    fn test_invalid_transcript_is_rejected() {
        let mut pool = TranscriptPool::new();
        let broken = Transcript::new("broken", "chr1", Strand::Plus, vec![]);
        assert!(matches!(pool.add("test", broken), Err(LociError::Transcript(_))));
        assert!(pool.is_empty());
    }
}
