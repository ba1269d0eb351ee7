//! Core models for loctars.
//!
//! This crate holds the pieces every other loctars crate agrees on:
//!
//! - [`models::Transcript`]: a finalized transcript record with exon, intron and CDS geometry
//! - [`models::Strand`]: the genomic strand of a record
//! - [`models::GffLine`]: a single GFF3 record, used to write and re-read partial outputs
//! - [`utils`]: readers and writers that transparently handle gzip
//!
//! Coordinates are 1-based and closed on both ends, as in GFF3.

pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{GffError, TranscriptError};
pub use models::{GffLine, RelativeMetrics, Segment, Strand, Transcript};
