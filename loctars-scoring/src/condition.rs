use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Within,
    NotWithin,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Within => "within",
            Operator::NotWithin => "not within",
        }
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.split_whitespace().collect::<Vec<&str>>().join(" ");
        match normalised.as_str() {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "ge" => Ok(Operator::Ge),
            "lt" => Ok(Operator::Lt),
            "le" => Ok(Operator::Le),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "within" => Ok(Operator::Within),
            "not within" => Ok(Operator::NotWithin),
            _ => Err(ConfigError::UnknownOperator(s.to_string())),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// The value side of a condition, as written in the configuration file.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawThreshold {
    Bool(bool),
    Number(f64),
    List(Vec<f64>),
}

/// `operator` + `value` pair, as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
    pub operator: String,
    pub value: RawThreshold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Value(f64),
    Set(Vec<f64>),
    Range(f64, f64),
}

///
/// A compiled comparison of a metric value against a threshold.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub operator: Operator,
    pub threshold: Threshold,
}

impl Condition {
    pub fn new(operator: Operator, raw: &RawThreshold) -> ConfigResult<Self> {
        let invalid = |reason: &str| ConfigError::InvalidThreshold {
            operator: operator.to_string(),
            reason: reason.to_string(),
        };

        let threshold = match operator {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Ge
            | Operator::Lt
            | Operator::Le => match raw {
                RawThreshold::Bool(b) => Threshold::Value(if *b { 1.0 } else { 0.0 }),
                RawThreshold::Number(n) => Threshold::Value(*n),
                RawThreshold::List(_) => return Err(invalid("expected a single value")),
            },
            Operator::In | Operator::NotIn => match raw {
                RawThreshold::List(values) => Threshold::Set(values.clone()),
                RawThreshold::Number(n) => Threshold::Set(vec![*n]),
                RawThreshold::Bool(_) => return Err(invalid("expected a list of values")),
            },
            Operator::Within | Operator::NotWithin => match raw {
                RawThreshold::List(values) if values.len() == 2 => {
                    Threshold::Range(values[0].min(values[1]), values[0].max(values[1]))
                }
                _ => return Err(invalid("expected a two-element range")),
            },
        };

        Ok(Condition {
            operator,
            threshold,
        })
    }

    pub fn evaluate(&self, value: f64) -> bool {
        match (&self.operator, &self.threshold) {
            (Operator::Eq, Threshold::Value(t)) => value == *t,
            (Operator::Ne, Threshold::Value(t)) => value != *t,
            (Operator::Gt, Threshold::Value(t)) => value > *t,
            (Operator::Ge, Threshold::Value(t)) => value >= *t,
            (Operator::Lt, Threshold::Value(t)) => value < *t,
            (Operator::Le, Threshold::Value(t)) => value <= *t,
            (Operator::In, Threshold::Set(set)) => set.contains(&value),
            (Operator::NotIn, Threshold::Set(set)) => !set.contains(&value),
            (Operator::Within, Threshold::Range(low, high)) => *low <= value && value <= *high,
            (Operator::NotWithin, Threshold::Range(low, high)) => value < *low || value > *high,
            // unreachable through `Condition::new`
            _ => false,
        }
    }
}

impl TryFrom<&RawCondition> for Condition {
    type Error = ConfigError;

    fn try_from(raw: &RawCondition) -> Result<Self, Self::Error> {
        let operator: Operator = raw.operator.parse()?;
        Condition::new(operator, &raw.value)
    }
}
