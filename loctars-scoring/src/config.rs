use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use loctars_core::models::Transcript;

use crate::condition::{Condition, RawCondition, RawThreshold};
use crate::consts::{
    DEFAULT_FRAGMENTS_MAXIMAL_CDS, DEFAULT_ID_PREFIX, DEFAULT_MULTIPLIER, DEFAULT_SOURCE,
    DEFAULT_THREADS,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::expression::Expression;
use crate::metrics::Metric;
use crate::rescaling::{Rescaling, RescalingKind};

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RawScoringParam {
    pub rescaling: RescalingKind,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub filter: Option<RawCondition>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RawParameter {
    /// Metric to test; defaults to the parameter key up to its first `.`
    #[serde(default)]
    pub name: Option<String>,
    pub operator: String,
    pub value: RawThreshold,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct RawRequirements {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, RawParameter>,
}

/// How ties between equally scored transcripts are broken.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Highest score, then smallest id.
    #[default]
    Score,
    /// Highest score, then longest cDNA, then smallest id.
    ScoreThenLength,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunOptions {
    pub purge: bool,
    pub remove_overlapping_fragments: bool,
    pub fragments_maximal_cds: u32,
    pub threads: usize,
    pub exclude_cds: bool,
    pub tie_break: TieBreak,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            purge: false,
            remove_overlapping_fragments: true,
            fragments_maximal_cds: DEFAULT_FRAGMENTS_MAXIMAL_CDS,
            threads: DEFAULT_THREADS,
            exclude_cds: false,
            tie_break: TieBreak::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputFormat {
    pub source: String,
    pub id_prefix: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat {
            source: DEFAULT_SOURCE.to_string(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

///
/// The configuration document exactly as it is written on disk.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RawConfig {
    pub scoring: BTreeMap<String, RawScoringParam>,
    #[serde(default)]
    pub requirements: Option<RawRequirements>,
    #[serde(default)]
    pub run_options: RunOptions,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParam {
    pub metric: Metric,
    pub rescaling: Rescaling,
    pub multiplier: f64,
    pub filter: Option<Condition>,
}

impl ScoringParam {
    pub fn name(&self) -> &'static str {
        self.metric.name()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub metric: Metric,
    pub condition: Condition,
}

///
/// Compiled requirements: a boolean expression over named metric conditions.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Requirements {
    pub expression: Expression,
    pub parameters: BTreeMap<String, Parameter>,
}

impl Requirements {
    pub fn passes(&self, transcript: &Transcript) -> bool {
        let outcomes: BTreeMap<&str, bool> = self
            .parameters
            .iter()
            .map(|(key, p)| (key.as_str(), p.condition.evaluate(p.metric.value(transcript))))
            .collect();
        self.expression
            .evaluate(&|name: &str| outcomes.get(name).copied().unwrap_or(false))
    }
}

///
/// Immutable, validated configuration shared by every stage of the picker.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PickConfig {
    /// Scoring metrics, sorted by name.
    pub scoring: Vec<ScoringParam>,
    pub requirements: Option<Requirements>,
    pub run_options: RunOptions,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    ///
    /// Determine the format of a configuration file from its extension.
    ///
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::InvalidFileType),
        }
    }
}

fn compile_scoring(key: &str, raw: &RawScoringParam) -> ConfigResult<ScoringParam> {
    let metric: Metric = key.parse()?;
    let rescaling = match (raw.rescaling, raw.value) {
        (RescalingKind::Target, Some(value)) => Rescaling::Target(value),
        (RescalingKind::Target, None) => return Err(ConfigError::MissingTarget(key.to_string())),
        (_, Some(_)) => return Err(ConfigError::UnexpectedTarget(key.to_string())),
        (RescalingKind::Max, None) => Rescaling::Max,
        (RescalingKind::Min, None) => Rescaling::Min,
    };
    let filter = raw.filter.as_ref().map(Condition::try_from).transpose()?;
    Ok(ScoringParam {
        metric,
        rescaling,
        multiplier: raw.multiplier,
        filter,
    })
}

fn compile_requirements(raw: &RawRequirements) -> ConfigResult<Option<Requirements>> {
    if raw.parameters.is_empty() && raw.expression.is_none() {
        return Ok(None);
    }

    let mut parameters = BTreeMap::new();
    for (key, param) in raw.parameters.iter() {
        let name = match &param.name {
            Some(name) => name.as_str(),
            None => key.split('.').next().unwrap_or(key),
        };
        let metric: Metric = name.parse()?;
        let condition = Condition::new(param.operator.parse()?, &param.value)?;
        parameters.insert(key.clone(), Parameter { metric, condition });
    }

    let declared: BTreeSet<String> = parameters.keys().cloned().collect();
    let expression = match &raw.expression {
        Some(text) => Expression::compile(text, &declared)?,
        None => Expression::all_of(declared.iter()),
    };

    Ok(Some(Requirements {
        expression,
        parameters,
    }))
}

impl TryFrom<RawConfig> for PickConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if raw.scoring.is_empty() {
            return Err(ConfigError::EmptyScoring);
        }
        let scoring = raw
            .scoring
            .iter()
            .map(|(key, param)| compile_scoring(key, param))
            .collect::<ConfigResult<Vec<ScoringParam>>>()?;

        let requirements = match &raw.requirements {
            Some(requirements) => compile_requirements(requirements)?,
            None => None,
        };

        debug!(
            "Compiled configuration: {} scoring metrics, requirements: {}",
            scoring.len(),
            requirements
                .as_ref()
                .map(|r| r.expression.to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(PickConfig {
            scoring,
            requirements,
            run_options: raw.run_options,
            output_format: raw.output_format,
        })
    }
}

impl PickConfig {
    pub fn parse(text: &str, format: ConfigFormat) -> ConfigResult<Self> {
        let raw: RawConfig = match format {
            ConfigFormat::Toml => toml::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
            ConfigFormat::Json => serde_json::from_str(text)?,
        };
        PickConfig::try_from(raw)
    }

    /// Names of the scoring metrics, in the column order of the score tables.
    pub fn scoring_keys(&self) -> Vec<&'static str> {
        self.scoring.iter().map(|p| p.name()).collect()
    }
}

impl FromStr for PickConfig {
    type Err = ConfigError;

    /// Parse a TOML document.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PickConfig::parse(s, ConfigFormat::Toml)
    }
}

impl TryFrom<&Path> for PickConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let format = ConfigFormat::from_path(path)?;
        let text = read_to_string(path)?;
        PickConfig::parse(&text, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Operator;
    use loctars_core::models::Strand;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::tempdir;

    const TOML_CONFIG: &str = r#"
[scoring.cdna_length]
rescaling = "max"

[scoring.exon_num]
rescaling = "target"
value = 3
multiplier = 2

[scoring.retained_fraction]
rescaling = "min"
filter = { operator = "lt", value = 0.5 }

[requirements]
expression = "cdna_length and (exon_num.multi or exon_num.mono)"

[requirements.parameters.cdna_length]
operator = "ge"
value = 200

[requirements.parameters."exon_num.multi"]
operator = "ge"
value = 2

[requirements.parameters."exon_num.mono"]
name = "exon_num"
operator = "eq"
value = 1

[run_options]
purge = true
threads = 4
"#;

    #[fixture]
    fn config() -> PickConfig {
        TOML_CONFIG.parse().unwrap()
    }

    #[rstest]
    fn test_parse_toml(config: PickConfig) {
        assert_eq!(
            config.scoring_keys(),
            vec!["cdna_length", "exon_num", "retained_fraction"]
        );
        assert_eq!(config.scoring[1].rescaling, Rescaling::Target(3.0));
        assert_eq!(config.scoring[1].multiplier, 2.0);
        assert_eq!(config.scoring[0].multiplier, 1.0);
        assert_eq!(
            config.scoring[2].filter.as_ref().unwrap().operator,
            Operator::Lt
        );

        let requirements = config.requirements.as_ref().unwrap();
        assert_eq!(requirements.parameters["exon_num.multi"].metric, Metric::ExonNum);
        assert_eq!(requirements.parameters["exon_num.mono"].metric, Metric::ExonNum);

        assert!(config.run_options.purge);
        assert_eq!(config.run_options.threads, 4);
        assert!(config.run_options.remove_overlapping_fragments);
        assert_eq!(config.run_options.fragments_maximal_cds, 100);
        assert_eq!(config.run_options.tie_break, TieBreak::Score);
        assert_eq!(config.output_format.id_prefix, "loctars");
    }

    #[rstest]
    fn test_requirements_pass(config: PickConfig) {
        let requirements = config.requirements.unwrap();

        let mut long_multi = Transcript::new("a", "chr1", Strand::Plus, vec![(1, 100), (201, 400)]);
        long_multi.finalize().unwrap();
        assert!(requirements.passes(&long_multi));

        let mut short_multi = Transcript::new("b", "chr1", Strand::Plus, vec![(1, 50), (201, 250)]);
        short_multi.finalize().unwrap();
        assert!(!requirements.passes(&short_multi));

        let mut long_mono = Transcript::new("c", "chr1", Strand::Plus, vec![(1, 300)]);
        long_mono.finalize().unwrap();
        assert!(requirements.passes(&long_mono));
    }

    #[rstest]
    fn test_default_expression_is_conjunction() {
        let text = r#"
[scoring.cdna_length]
rescaling = "max"

[requirements.parameters.cdna_length]
operator = "ge"
value = 200

[requirements.parameters.exon_num]
operator = "gt"
value = 1
"#;
        let config: PickConfig = text.parse().unwrap();
        let requirements = config.requirements.unwrap();
        assert_eq!(
            requirements.expression.parameters(),
            BTreeSet::from(["cdna_length", "exon_num"])
        );

        let mut mono = Transcript::new("c", "chr1", Strand::Plus, vec![(1, 300)]);
        mono.finalize().unwrap();
        assert!(!requirements.passes(&mono));
    }

    #[rstest]
    #[case("[scoring.bogus]\nrescaling = \"max\"\n")]
    #[case("[scoring.cdna_length]\nrescaling = \"target\"\n")]
    #[case("[scoring.cdna_length]\nrescaling = \"max\"\nvalue = 3\n")]
    #[case("[scoring.cdna_length]\nrescaling = \"max\"\n[requirements]\nexpression = \"missing\"\n")]
    #[case("[scoring.cdna_length]\nrescaling = \"max\"\n[requirements.parameters.cdna_length]\noperator = \"approx\"\nvalue = 1\n")]
    #[case("[scoring]\n")]
    fn test_invalid_configs(#[case] text: &str) {
        assert!(text.parse::<PickConfig>().is_err());
    }

    #[rstest]
    #[case("conf.toml", TOML_CONFIG)]
    #[case(
        "conf.json",
        r#"{"scoring": {"cdna_length": {"rescaling": "max"}}, "run_options": {"tie_break": "score_then_length"}}"#
    )]
    #[case(
        "conf.yaml",
        "scoring:\n  cdna_length:\n    rescaling: max\noutput_format:\n  id_prefix: sample\n"
    )]
    fn test_try_from_path(#[case] name: &str, #[case] contents: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        let config = PickConfig::try_from(path.as_path()).unwrap();
        assert!(config.scoring_keys().contains(&"cdna_length"));
    }

    #[rstest]
    fn test_unsupported_extension() {
        let result = PickConfig::try_from(Path::new("conf.ini"));
        assert!(matches!(result, Err(ConfigError::InvalidFileType)));
    }
}
