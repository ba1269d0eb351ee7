use std::collections::BTreeMap;

use loctars_core::models::{GffLine, Segment, Transcript};
use loctars_overlaprs::overlap;
use loctars_scoring::PickConfig;

use crate::printing::{container_line, metrics_row, scores_row, transcript_lines};

///
/// Final gene-level group. A locus holds its primary transcript, chosen by
/// the monosublocus holder, together with the per-metric scores it got there.
///
#[derive(Debug, Clone)]
pub struct Locus {
    pub id: String,
    pub parent: Option<String>,
    pub transcript: Transcript,
    pub scores: Option<BTreeMap<&'static str, f64>>,
    pub is_fragment: bool,
}

impl Locus {
    pub fn new(transcript: Transcript) -> Self {
        let id = format!(
            "locus:{}{}:{}-{}",
            transcript.chrom, transcript.strand, transcript.start, transcript.end
        );
        Locus {
            id,
            parent: None,
            transcript,
            scores: None,
            is_fragment: false,
        }
    }

    pub fn chrom(&self) -> &str {
        &self.transcript.chrom
    }

    pub fn span(&self) -> Segment {
        self.transcript.span()
    }

    pub fn monoexonic(&self) -> bool {
        self.transcript.monoexonic()
    }

    ///
    /// True if `other` looks like a spurious fragment of this locus: a short
    /// coding (or non-coding) monoexonic locus lying over a multiexonic one.
    /// The strand is not considered.
    ///
    pub fn other_is_fragment(&self, other: &Locus, maximal_cds: u32) -> bool {
        if self.monoexonic() || !other.monoexonic() {
            return false;
        }
        if other.transcript.combined_cds_length() >= maximal_cds {
            return false;
        }
        self.chrom() == other.chrom() && overlap(self.span(), other.span()) > 0
    }

    pub fn gff_lines(&self, source: &str, print_cds: bool) -> Vec<GffLine> {
        let t = &self.transcript;
        let mut gene = container_line(
            "gene",
            &self.id,
            self.parent.as_deref(),
            (&t.chrom, t.start, t.end, t.strand),
            source,
        );
        if self.is_fragment {
            gene.set_attribute("fragment", "True");
        }
        let mut lines = vec![gene];
        lines.extend(transcript_lines(t, &self.id, source, print_cds, &[("primary", "True")]));
        lines
    }

    pub fn metrics_row(&self) -> Vec<String> {
        metrics_row(&self.transcript, &self.id)
    }

    pub fn score_row(&self, config: &PickConfig) -> Vec<String> {
        scores_row(&self.transcript, &self.id, self.scores.as_ref(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loctars_core::models::Strand;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn locus(id: &str, strand: Strand, exons: Vec<Segment>, cds: Vec<Segment>) -> Locus {
        let mut t = Transcript::new(id, "chr1", strand, exons).with_cds(cds);
        t.finalize().unwrap();
        Locus::new(t)
    }

    #[fixture]
    fn multi() -> Locus {
        locus(
            "multi",
            Strand::Plus,
            vec![(1001, 1500), (2001, 2500), (3001, 3500)],
            vec![(1201, 1500), (2001, 2500), (3001, 3200)],
        )
    }

    #[rstest]
    #[case(vec![(2101, 2150)], true)]
    #[case(vec![(2001, 2500)], false)]
    #[case(vec![], true)]
    fn test_other_is_fragment(multi: Locus, #[case] cds: Vec<Segment>, #[case] expected: bool) {
        let mono = locus("mono", Strand::Minus, vec![(2001, 2500)], cds);
        assert_eq!(multi.other_is_fragment(&mono, 100), expected);
        assert!(!mono.other_is_fragment(&multi, 100));
    }

    #[rstest]
    fn test_distant_locus_is_not_a_fragment(multi: Locus) {
        let mono = locus("mono", Strand::Plus, vec![(5001, 5100)], vec![]);
        assert!(!multi.other_is_fragment(&mono, 100));
    }

    #[rstest]
    fn test_gff_lines(multi: Locus) {
        let mut fragment = locus("mono", Strand::Plus, vec![(2001, 2500)], vec![]);
        fragment.is_fragment = true;
        fragment.parent = Some("superlocus:chr1+:1001-3500".to_string());

        let lines = fragment.gff_lines("loctars", true);
        assert_eq!(lines[0].feature, "gene");
        assert_eq!(lines[0].attribute("fragment"), Some("True"));
        assert_eq!(lines[0].parent(), Some("superlocus:chr1+:1001-3500"));
        assert_eq!(lines[1].attribute("primary"), Some("True"));
        assert_eq!(lines[1].parent(), Some("locus:chr1+:2001-2500"));

        let lines = multi.gff_lines("loctars", false);
        assert_eq!(lines[0].attribute("fragment"), None);
        assert_eq!(lines.len(), 5);
    }
}
