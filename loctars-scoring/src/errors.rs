use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid value for operator `{operator}`: {reason}")]
    InvalidThreshold { operator: String, reason: String },

    #[error("Scoring metric {0} uses `target` rescaling but declares no value")]
    MissingTarget(String),

    #[error("Scoring metric {0} declares a value but does not use `target` rescaling")]
    UnexpectedTarget(String),

    #[error("The scoring section must declare at least one metric")]
    EmptyScoring,

    #[error("Syntax error in requirements expression at position {position}: {message}")]
    Expression { position: usize, message: String },

    #[error("Requirements expression references an undeclared parameter: {0}")]
    UndeclaredParameter(String),

    #[error(
        "Missing or invalid file extension in config file. It must be `toml`, `yaml`, `yml` or `json`"
    )]
    InvalidFileType,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
