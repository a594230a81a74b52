//! Declarative filter parameter descriptors and values.
//!
//! Descriptors are plain data: a UI or a pipeline-authoring tool can list them
//! (they serialize with serde) without running the filter.

use serde::{Deserialize, Serialize};

use crate::data::path::DataArrayPath;
use crate::filter::requirement::DataArrayRequirement;
use crate::pipeline_error::PipelineError;

/// What kind of value a parameter takes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec")]
pub enum ParameterKind {
    Int,
    Float,
    Bool,
    /// Index into the listed choices.
    Choice(Vec<String>),
    String,
    /// Path to an existing input array that must satisfy the requirement.
    ArrayPath(DataArrayRequirement),
    /// Path of an array the filter creates.
    CreatedArrayPath,
    /// Visual grouping only; carries no value.
    Separator,
}

/// A parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Choice(usize),
    String(String),
    Path(DataArrayPath),
    None,
}

/// Inclusive numeric bounds for `Int`/`Float` parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterConstraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterConstraint {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Checks `value` against the bounds.
    pub fn check(&self, key: &str, value: f64) -> Result<(), PipelineError> {
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            return Err(PipelineError::ParameterOutOfRange {
                key: key.to_string(),
                reason: format!(
                    "{value} is outside [{}, {}]",
                    self.min.map_or("-inf".to_string(), |v| v.to_string()),
                    self.max.map_or("inf".to_string(), |v| v.to_string())
                ),
            });
        }
        Ok(())
    }
}

/// Descriptor of one filter parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParameter {
    pub label: String,
    pub property_key: String,
    pub kind: ParameterKind,
    pub default: ParameterValue,
    pub constraint: Option<ParameterConstraint>,
}

impl FilterParameter {
    pub fn new(
        label: &str,
        property_key: &str,
        kind: ParameterKind,
        default: ParameterValue,
    ) -> Self {
        Self {
            label: label.to_string(),
            property_key: property_key.to_string(),
            kind,
            default,
            constraint: None,
        }
    }

    pub fn int(label: &str, key: &str, default: i64) -> Self {
        Self::new(label, key, ParameterKind::Int, ParameterValue::Int(default))
    }

    pub fn float(label: &str, key: &str, default: f64) -> Self {
        Self::new(label, key, ParameterKind::Float, ParameterValue::Float(default))
    }

    pub fn boolean(label: &str, key: &str, default: bool) -> Self {
        Self::new(label, key, ParameterKind::Bool, ParameterValue::Bool(default))
    }

    pub fn string(label: &str, key: &str, default: &str) -> Self {
        Self::new(
            label,
            key,
            ParameterKind::String,
            ParameterValue::String(default.to_string()),
        )
    }

    pub fn choice(label: &str, key: &str, choices: &[&str], default: usize) -> Self {
        Self::new(
            label,
            key,
            ParameterKind::Choice(choices.iter().map(|c| c.to_string()).collect()),
            ParameterValue::Choice(default),
        )
    }

    pub fn array_path(
        label: &str,
        default: DataArrayPath,
        requirement: DataArrayRequirement,
    ) -> Self {
        let key = requirement.property_key.clone();
        Self::new(
            label,
            &key,
            ParameterKind::ArrayPath(requirement),
            ParameterValue::Path(default),
        )
    }

    pub fn created_array_path(label: &str, key: &str, default: DataArrayPath) -> Self {
        Self::new(
            label,
            key,
            ParameterKind::CreatedArrayPath,
            ParameterValue::Path(default),
        )
    }

    pub fn separator(label: &str) -> Self {
        Self::new(label, "", ParameterKind::Separator, ParameterValue::None)
    }

    pub fn with_constraint(mut self, constraint: ParameterConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

fn invalid(key: &str, expected: &str, got: &ParameterValue) -> PipelineError {
    PipelineError::InvalidValue {
        key: key.to_string(),
        reason: format!("expected {expected}, got {got:?}"),
    }
}

impl ParameterValue {
    pub fn into_i64(self, key: &str) -> Result<i64, PipelineError> {
        match self {
            ParameterValue::Int(v) => Ok(v),
            other => Err(invalid(key, "an integer", &other)),
        }
    }

    /// Accepts `Float` and, widened, `Int`.
    pub fn into_f64(self, key: &str) -> Result<f64, PipelineError> {
        match self {
            ParameterValue::Float(v) => Ok(v),
            ParameterValue::Int(v) => Ok(v as f64),
            other => Err(invalid(key, "a number", &other)),
        }
    }

    pub fn into_bool(self, key: &str) -> Result<bool, PipelineError> {
        match self {
            ParameterValue::Bool(v) => Ok(v),
            other => Err(invalid(key, "a bool", &other)),
        }
    }

    /// Choice index, which must be `< choices`.
    pub fn into_choice(self, key: &str, choices: usize) -> Result<usize, PipelineError> {
        match self {
            ParameterValue::Choice(v) if v < choices => Ok(v),
            ParameterValue::Choice(v) => Err(PipelineError::InvalidValue {
                key: key.to_string(),
                reason: format!("choice {v} is not below {choices}"),
            }),
            other => Err(invalid(key, "a choice index", &other)),
        }
    }

    pub fn into_string(self, key: &str) -> Result<String, PipelineError> {
        match self {
            ParameterValue::String(v) => Ok(v),
            other => Err(invalid(key, "a string", &other)),
        }
    }

    /// Accepts `Path` or a `String` in `container|matrix|array` form.
    pub fn into_path(self, key: &str) -> Result<DataArrayPath, PipelineError> {
        match self {
            ParameterValue::Path(p) => Ok(p),
            ParameterValue::String(s) => s.parse().map_err(|_| PipelineError::InvalidValue {
                key: key.to_string(),
                reason: format!("`{s}` is not a container|matrix|array path"),
            }),
            other => Err(invalid(key, "a data array path", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_reject_wrong_kind() {
        assert_eq!(ParameterValue::Int(3).into_i64("n").unwrap(), 3);
        assert_eq!(ParameterValue::Int(3).into_f64("n").unwrap(), 3.0);
        assert!(matches!(
            ParameterValue::Bool(true).into_i64("n"),
            Err(PipelineError::InvalidValue { .. })
        ));
        assert!(ParameterValue::Choice(2).into_choice("d", 2).is_err());
    }

    #[test]
    fn string_paths_are_parsed() {
        let p = ParameterValue::String("a|b|c".into())
            .into_path("FeatureIdsArrayPath")
            .unwrap();
        assert_eq!(p, DataArrayPath::new("a", "b", "c"));
        assert!(ParameterValue::String("a|b".into()).into_path("k").is_err());
    }

    #[test]
    fn constraint_bounds() {
        let c = ParameterConstraint::at_least(1.0);
        assert!(c.check("NumIterations", 1.0).is_ok());
        assert!(matches!(
            c.check("NumIterations", 0.0),
            Err(PipelineError::ParameterOutOfRange { .. })
        ));
    }
}
