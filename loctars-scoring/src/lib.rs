//! Scoring configuration for the loctars locus picker.
//!
//! A configuration document has four sections:
//!
//! - `scoring`: metric name to rescaling policy, multiplier and optional filter
//! - `requirements`: a boolean expression over named metric conditions
//! - `run_options`: purge, fragment handling, worker count and tie-break policy
//! - `output_format`: GFF source column and the prefix of renamed ids
//!
//! Everything is resolved once at load time into a [`PickConfig`]; unknown
//! metric names, operators or malformed expressions are reported as
//! [`ConfigError`]s before any transcript is read.
//!
//! ```rust
//! use loctars_scoring::PickConfig;
//!
//! let config: PickConfig = r#"
//! [scoring.cdna_length]
//! rescaling = "max"
//! "#.parse().unwrap();
//! assert_eq!(config.scoring_keys(), vec!["cdna_length"]);
//! ```

pub mod condition;
pub mod config;
pub mod consts;
pub mod errors;
pub mod expression;
pub mod metrics;
pub mod rescaling;

// re-exports
pub use condition::{Condition, Operator, Threshold};
pub use config::{
    ConfigFormat, OutputFormat, Parameter, PickConfig, RawConfig, Requirements, RunOptions,
    ScoringParam, TieBreak,
};
pub use errors::{ConfigError, ConfigResult};
pub use expression::Expression;
pub use metrics::Metric;
pub use rescaling::Rescaling;
