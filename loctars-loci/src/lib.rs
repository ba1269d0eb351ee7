//! Locus containers and the decomposition of a region into loci.
//!
//! A [`Superlocus`] goes through three stages, each computed at most once:
//!
//! 1. [`Superlocus::define_subloci`]: clusters the transcripts into [`Sublocus`]
//!    containers (shared junctions, or overlapping single exons)
//! 2. [`Superlocus::define_monosubloci`]: scores each sublocus and picks
//!    non-intersecting winners, the [`Monosublocus`] containers
//! 3. [`Superlocus::define_loci`]: pools the monosubloci in a
//!    [`MonosublocusHolder`] and picks the final [`Locus`] set
//!
//! [`remove_fragments`] then flags or drops the short monoexonic loci lying
//! over multiexonic ones.
//!
//! ```rust
//! use loctars_core::models::{Strand, Transcript};
//! use loctars_loci::{Level, Superlocus};
//! use loctars_scoring::PickConfig;
//!
//! let config: PickConfig = "[scoring.cdna_length]\nrescaling = \"max\"\n".parse().unwrap();
//! let t = Transcript::new("t1", "chr1", Strand::Plus, vec![(1, 100), (201, 300)]);
//!
//! let mut superlocus = Superlocus::new(t, true).unwrap();
//! superlocus.define_loci(&config).unwrap();
//! let gff = superlocus.format_gff(Level::Loci, "loctars", true).unwrap();
//! assert_eq!(gff.last().map(|s| s.as_str()), Some("###"));
//! ```

pub mod container;
pub mod errors;
pub mod excluded;
pub mod fragments;
pub mod holder;
pub mod locus;
pub mod monosublocus;
pub mod picking;
pub mod printing;
pub mod scores;
pub mod sublocus;
pub mod superlocus;

// re-exports
pub use container::TranscriptPool;
pub use errors::{LociError, LociResult};
pub use excluded::Excluded;
pub use fragments::remove_fragments;
pub use holder::MonosublocusHolder;
pub use locus::Locus;
pub use monosublocus::Monosublocus;
pub use picking::{choose_best, compare_candidates, select_winners};
pub use printing::{BLOCK_SEPARATOR, NA, metrics_header, scores_header};
pub use scores::{ScoreTable, ScoringOutcome, score_pool};
pub use sublocus::{ScoringStage, Sublocus};
pub use superlocus::{Level, Stage, Superlocus};
