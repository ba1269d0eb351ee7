use serde::{Deserialize, Serialize};

/// Rescaling policy as spelled in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescalingKind {
    Max,
    Min,
    Target,
}

///
/// Per-metric normalisation of raw values into `[0, 1]`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rescaling {
    /// Highest value scores 1.
    Max,
    /// Lowest value scores 1.
    Min,
    /// Values closest to the target score 1.
    Target(f64),
}

impl Rescaling {
    ///
    /// Rescale every value against the whole population.
    ///
    /// - `max`: `(v - min) / (max - min)`
    /// - `min`: `1 - (v - min) / (max - min)`
    /// - `target`: `1 - |v - target| / max(|v - target|)`
    ///
    /// A population without spread, such as a single transcript, scores 1
    /// for everyone under `max` and `min`. Under `target` every value equal
    /// to the target scores 1; otherwise the furthest value still scores 0.
    ///
    pub fn rescale(&self, values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let denominator = match self {
            Rescaling::Target(target) => values
                .iter()
                .map(|v| (v - target).abs())
                .fold(0.0, f64::max),
            _ => maximum - minimum,
        };
        if denominator == 0.0 && !matches!(self, Rescaling::Target(_)) {
            return vec![1.0; values.len()];
        }
        let denominator = if denominator == 0.0 { 1.0 } else { denominator };

        values
            .iter()
            .map(|v| match self {
                Rescaling::Max => ((v - minimum) / denominator).abs(),
                Rescaling::Min => (1.0 - (v - minimum) / denominator).abs(),
                Rescaling::Target(target) => 1.0 - (v - target).abs() / denominator,
            })
            .collect()
    }
}
