use log::debug;

use loctars_overlaprs::exonic_overlap;
use loctars_scoring::PickConfig;

use crate::container::TranscriptPool;
use crate::errors::{LociError, LociResult};
use crate::locus::Locus;
use crate::monosublocus::Monosublocus;
use crate::picking::select_winners;
use crate::scores::score_pool;

///
/// Pools the monosubloci of a superlocus, across sublocus boundaries, and
/// picks the final loci among them with the coarser exonic-overlap predicate.
///
#[derive(Debug, Clone, Default)]
pub struct MonosublocusHolder {
    pool: TranscriptPool,
}

impl MonosublocusHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> String {
        format!(
            "holder:{}{}:{}-{}",
            self.pool.chrom(),
            self.pool.strand(),
            self.pool.start(),
            self.pool.end()
        )
    }

    pub fn add_monosublocus(&mut self, monosublocus: Monosublocus) -> LociResult<()> {
        let id = self.id();
        self.pool.add(&id, monosublocus.transcript)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    ///
    /// Rescore the pooled transcripts against each other, then select winners
    /// until no transcript is left. Nothing is purged at this stage.
    ///
    pub fn define_loci(&mut self, config: &PickConfig) -> LociResult<Vec<Locus>> {
        let id = self.id();
        if self.pool.is_empty() {
            return Err(LociError::Empty(id));
        }
        debug!("Defining loci for {} ({} transcripts)", id, self.pool.len());

        let mut outcome = score_pool(&mut self.pool, config, false);
        let winners = select_winners(
            &id,
            self.pool.transcripts(),
            exonic_overlap,
            config.run_options.tie_break,
            false,
        )?;

        let mut loci: Vec<Locus> = winners
            .into_iter()
            .filter_map(|tid| {
                let scores = outcome.scores.remove(&tid);
                self.pool.remove(&tid).map(|transcript| {
                    let mut locus = Locus::new(transcript);
                    locus.scores = scores;
                    locus
                })
            })
            .collect();
        loci.sort_by(|a, b| a.transcript.position_key().cmp(&b.transcript.position_key()));
        Ok(loci)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loctars_core::models::{Segment, Strand, Transcript};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn monosublocus(id: &str, exons: Vec<Segment>) -> Monosublocus {
        let mut t = Transcript::new(id, "chr2", Strand::Plus, exons);
        t.finalize().unwrap();
        Monosublocus::new(t)
    }

    #[fixture]
    fn config() -> PickConfig {
        r#"
[scoring.cdna_length]
rescaling = "max"
"#
        .parse()
        .unwrap()
    }

    #[rstest]
    fn test_exon_overlap_merges_across_subloci(config: PickConfig) {
        // no shared junctions, so these came from different subloci,
        // but their exons overlap
        let mut holder = MonosublocusHolder::new();
        holder
            .add_monosublocus(monosublocus("long", vec![(1, 300), (501, 800)]))
            .unwrap();
        holder
            .add_monosublocus(monosublocus("short", vec![(101, 200), (601, 700)]))
            .unwrap();
        holder
            .add_monosublocus(monosublocus("far", vec![(2001, 2100), (2301, 2400)]))
            .unwrap();

        let loci = holder.define_loci(&config).unwrap();
        let ids: Vec<&str> = loci.iter().map(|l| l.transcript.id.as_str()).collect();
        assert_eq!(ids, vec!["long", "far"]);
        assert_eq!(loci[0].id, "locus:chr2+:1-800");
        assert_eq!(loci[0].scores.as_ref().unwrap()["cdna_length"], 1.0);
    }

    #[rstest]
    fn test_empty_holder(config: PickConfig) {
        let mut holder = MonosublocusHolder::new();
        assert!(matches!(holder.define_loci(&config), Err(LociError::Empty(_))));
    }
}
