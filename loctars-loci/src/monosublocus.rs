use loctars_core::models::{GffLine, Segment, Transcript};

use crate::printing::{container_line, transcript_lines};

///
/// A single winning transcript extracted from a sublocus.
///
#[derive(Debug, Clone)]
pub struct Monosublocus {
    pub id: String,
    pub parent: Option<String>,
    pub transcript: Transcript,
}

impl Monosublocus {
    pub fn new(transcript: Transcript) -> Self {
        let id = format!(
            "monosublocus:{}{}:{}-{}",
            transcript.chrom, transcript.strand, transcript.start, transcript.end
        );
        Monosublocus {
            id,
            parent: None,
            transcript,
        }
    }

    /// Append the position of the monosublocus within its superlocus to the id.
    pub fn set_ordinal(&mut self, ordinal: usize) {
        let t = &self.transcript;
        self.id = format!(
            "monosublocus:{}{}:{}-{}.{}",
            t.chrom, t.strand, t.start, t.end, ordinal
        );
    }

    pub fn span(&self) -> Segment {
        self.transcript.span()
    }

    pub fn monoexonic(&self) -> bool {
        self.transcript.monoexonic()
    }

    pub fn gff_lines(&self, source: &str, print_cds: bool) -> Vec<GffLine> {
        let t = &self.transcript;
        let mut lines = vec![container_line(
            "monosublocus",
            &self.id,
            self.parent.as_deref(),
            (&t.chrom, t.start, t.end, t.strand),
            source,
        )];
        lines.extend(transcript_lines(t, &self.id, source, print_cds, &[]));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loctars_core::models::Strand;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gff_lines() {
        let mut t = Transcript::new("t1", "chr3", Strand::Plus, vec![(10, 20), (30, 40)]);
        t.finalize().unwrap();
        let mut mono = Monosublocus::new(t);
        mono.parent = Some("superlocus:chr3+:10-40".to_string());

        let lines = mono.gff_lines("loctars", true);
        assert_eq!(mono.id, "monosublocus:chr3+:10-40");
        assert_eq!(lines[0].feature, "monosublocus");
        assert_eq!(lines[0].parent(), Some("superlocus:chr3+:10-40"));
        assert_eq!(lines[1].parent(), Some(mono.id.as_str()));
        assert_eq!(lines.len(), 4);

        mono.set_ordinal(3);
        assert_eq!(mono.id, "monosublocus:chr3+:10-40.3");
        assert_eq!(mono.gff_lines("loctars", true)[1].parent(), Some("monosublocus:chr3+:10-40.3"));
    }
}
