use std::fmt::{self, Display};
use std::str::FromStr;

use loctars_core::models::Transcript;

use crate::errors::ConfigError;

macro_rules! registry {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        ///
        /// Every metric that can be referenced from the `scoring` and
        /// `requirements` sections of the configuration.
        ///
        /// Names are resolved once, when the configuration is loaded; an
        /// unknown name is a configuration error.
        ///
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Metric {
            $($variant),+
        }

        impl Metric {
            /// All registered metrics, in the column order used by the metrics tables.
            pub const ALL: &'static [Metric] = &[$(Metric::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Metric::$variant => $name),+
                }
            }
        }

        impl FromStr for Metric {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Metric::$variant),)+
                    _ => Err(ConfigError::UnknownMetric(s.to_string())),
                }
            }
        }
    };
}

registry! {
    CdnaLength => "cdna_length",
    ExonNum => "exon_num",
    IntronNum => "intron_num",
    MaxIntronLength => "max_intron_length",
    MinIntronLength => "min_intron_length",
    CombinedCdsLength => "combined_cds_length",
    CombinedCdsNum => "combined_cds_num",
    CombinedCdsFraction => "combined_cds_fraction",
    CombinedUtrLength => "combined_utr_length",
    FiveUtrLength => "five_utr_length",
    ThreeUtrLength => "three_utr_length",
    FiveUtrNum => "five_utr_num",
    ThreeUtrNum => "three_utr_num",
    HasStartCodon => "has_start_codon",
    HasStopCodon => "has_stop_codon",
    IsComplete => "is_complete",
    VerifiedIntronsNum => "verified_introns_num",
    ProportionVerifiedIntrons => "proportion_verified_introns",
    ExonFraction => "exon_fraction",
    IntronFraction => "intron_fraction",
    CombinedCdsIntronFraction => "combined_cds_intron_fraction",
    RetainedIntronNum => "retained_intron_num",
    RetainedFraction => "retained_fraction",
    ProportionVerifiedIntronsInlocus => "proportion_verified_introns_inlocus",
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl Metric {
    ///
    /// True for metrics that depend on the container holding the transcript.
    /// Their value is only meaningful after the container computed them.
    ///
    pub fn is_relative(&self) -> bool {
        matches!(
            self,
            Metric::ExonFraction
                | Metric::IntronFraction
                | Metric::CombinedCdsIntronFraction
                | Metric::RetainedIntronNum
                | Metric::RetainedFraction
                | Metric::ProportionVerifiedIntronsInlocus
        )
    }

    /// Boolean metrics are reported as `True`/`False` rather than numbers.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Metric::HasStartCodon | Metric::HasStopCodon | Metric::IsComplete
        )
    }

    ///
    /// Value of this metric for a finalized transcript. Booleans map to 0/1.
    ///
    pub fn value(&self, transcript: &Transcript) -> f64 {
        match self {
            Metric::CdnaLength => transcript.cdna_length() as f64,
            Metric::ExonNum => transcript.exon_num() as f64,
            Metric::IntronNum => transcript.introns().len() as f64,
            Metric::MaxIntronLength => transcript.max_intron_length() as f64,
            Metric::MinIntronLength => transcript.min_intron_length() as f64,
            Metric::CombinedCdsLength => transcript.combined_cds_length() as f64,
            Metric::CombinedCdsNum => transcript.combined_cds_num() as f64,
            Metric::CombinedCdsFraction => transcript.combined_cds_fraction(),
            Metric::CombinedUtrLength => transcript.combined_utr_length() as f64,
            Metric::FiveUtrLength => transcript.five_utr_length() as f64,
            Metric::ThreeUtrLength => transcript.three_utr_length() as f64,
            Metric::FiveUtrNum => transcript.five_utr().len() as f64,
            Metric::ThreeUtrNum => transcript.three_utr().len() as f64,
            Metric::HasStartCodon => flag(transcript.has_start_codon),
            Metric::HasStopCodon => flag(transcript.has_stop_codon),
            Metric::IsComplete => flag(transcript.is_complete()),
            Metric::VerifiedIntronsNum => transcript.verified_introns_num() as f64,
            Metric::ProportionVerifiedIntrons => transcript.proportion_verified_introns(),
            Metric::ExonFraction => transcript.metrics.exon_fraction,
            Metric::IntronFraction => transcript.metrics.intron_fraction,
            Metric::CombinedCdsIntronFraction => transcript.metrics.combined_cds_intron_fraction,
            Metric::RetainedIntronNum => transcript.metrics.retained_introns.len() as f64,
            Metric::RetainedFraction => transcript.metrics.retained_fraction,
            Metric::ProportionVerifiedIntronsInlocus => {
                transcript.metrics.proportion_verified_introns_inlocus
            }
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
