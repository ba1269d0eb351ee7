use thiserror::Error;

/// Raised when a transcript record has geometry that cannot be finalized.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcript {0} has no exons")]
    NoExons(String),

    #[error("Transcript {0} has an inverted segment: {1}-{2}")]
    InvertedSegment(String, u32, u32),

    #[error("Transcript {0} has overlapping exons: {1}-{2} and {3}-{4}")]
    OverlappingExons(String, u32, u32, u32, u32),

    #[error("Transcript {0} has touching exons with no intron between them: {1}-{2} and {3}-{4}")]
    TouchingExons(String, u32, u32, u32, u32),

    #[error("Transcript {id} declares span {start}-{end} but its exons cover {exon_start}-{exon_end}")]
    SpanMismatch {
        id: String,
        start: u32,
        end: u32,
        exon_start: u32,
        exon_end: u32,
    },

    #[error("Transcript {0} has a CDS segment outside of its exons: {1}-{2}")]
    CdsOutsideExons(String, u32, u32),
}

#[derive(Error, Debug)]
pub enum GffError {
    #[error("Expected 9 tab-separated fields, found {0}: {1}")]
    FieldCount(usize, String),

    #[error("Invalid coordinate in GFF line: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid strand in GFF line: {0}")]
    InvalidStrand(String),

    #[error("Invalid score in GFF line: {0}")]
    InvalidScore(String),
}
