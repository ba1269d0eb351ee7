use thiserror::Error;

use loctars_core::errors::TranscriptError;

#[derive(Error, Debug)]
pub enum LociError {
    #[error(
        "Cannot add {transcript} to {container}: monoexonic and multiexonic transcripts cannot share a sublocus"
    )]
    Incompatible {
        container: String,
        transcript: String,
    },

    #[error("Cannot add {transcript} to {container}: expected chromosome {expected}, found {found}")]
    ChromosomeMismatch {
        container: String,
        transcript: String,
        expected: String,
        found: String,
    },

    #[error("Cannot add {transcript} to stranded {container}: strand {found} differs")]
    StrandMismatch {
        container: String,
        transcript: String,
        found: String,
    },

    #[error("{container} already contains a transcript named {transcript}")]
    DuplicateTranscript {
        container: String,
        transcript: String,
    },

    #[error("{0} has no transcripts")]
    Empty(String),

    #[error("No transcripts to remove from the pool for {container}; remaining: {remaining:?}")]
    NoProgress {
        container: String,
        remaining: Vec<Vec<String>>,
    },

    #[error("{container} has not reached the {required} stage")]
    StageNotReached {
        container: String,
        required: &'static str,
    },

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

pub type LociResult<T> = std::result::Result<T, LociError>;
