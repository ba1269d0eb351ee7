//! Overlap predicates and clique-based clustering of transcripts.
//!
//! All overlap computation and graph clustering used by the locus picker lives here.
//! Higher-level crates (loci, pick) decide *which* predicate to use at each stage and
//! hand it to [`OverlapGraph::build`]; they should not reimplement the clustering.
//!
//! ## Quick Start
//!
//! ```rust
//! use loctars_overlaprs::{OverlapGraph, find_communities, overlap};
//!
//! let spans = vec![("a", (1u32, 100u32)), ("b", (50, 150)), ("c", (140, 200)), ("d", (500, 600))];
//! let graph = OverlapGraph::build(
//!     spans.iter().map(|(k, s)| (k.to_string(), s)),
//!     |x, y| overlap(*x, *y) > 0,
//! );
//!
//! let (cliques, communities) = find_communities(&graph);
//! // a-b and b-c overlap, but a-c do not: two cliques, one community
//! assert_eq!(cliques.len(), 3);
//! assert_eq!(communities.len(), 2);
//! ```

/// Maximal clique enumeration and clique merging.
pub mod cliques;

/// Undirected graph over container keys.
pub mod graph;

/// Pairwise overlap tests.
pub mod overlap;

// re-exports
pub use self::cliques::{find_cliques, find_communities, merge_cliques};
pub use self::graph::OverlapGraph;
pub use self::overlap::{contains, exonic_overlap, is_intersecting, overlap};
