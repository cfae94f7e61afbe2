use std::collections::BTreeSet;
use std::fmt;

use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

use crate::style::AnnotationType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    UnknownType(String),
    UnknownOperator { kind: String, operator: String },
    MissingField { operator: String, field: &'static str },
}

impl fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterParseError::UnknownType(t) => write!(f, "unknown filter type `{t}`"),
            FilterParseError::UnknownOperator { kind, operator } => {
                write!(f, "unknown operator `{operator}` for filter type `{kind}`")
            }
            FilterParseError::MissingField { operator, field } => {
                write!(f, "filter operator `{operator}` requires field `{field}`")
            }
        }
    }
}

impl std::error::Error for FilterParseError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
        }
    }

    fn parse(op: &str) -> Option<Self> {
        match op {
            ">" => Some(Comparison::Gt),
            "<" => Some(Comparison::Lt),
            ">=" => Some(Comparison::Ge),
            "<=" => Some(Comparison::Le),
            "==" => Some(Comparison::Eq),
            _ => None,
        }
    }
}

/// Typed filter predicate over a feature attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    NumberCompare { op: Comparison, value: f64 },
    /// Boundary-inclusive at both ends.
    NumberBetween { min: f64, max: f64 },
    StringEquals(String),
    StringContains(String),
    StringIn(Vec<String>),
    BoolEquals(bool),
}

/// A user-authored attribute filter attached to a vector layer's style.
///
/// Disabled filters never reach the expression tree, but they stay attached
/// to their layer so reactivation restores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub struct Filter {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub user_enabled: bool,
    pub interactable: bool,
    /// Annotation sub-types this filter applies to.
    pub layers: Vec<AnnotationType>,
    pub predicate: Predicate,
}

/// Wire form: a flat object discriminated by `type` and `operator`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilter {
    key: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_value: Option<f64>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    user_enabled: bool,
    #[serde(default)]
    interactable: bool,
    #[serde(default)]
    layers: Vec<AnnotationType>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = FilterParseError;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        let missing = |field| FilterParseError::MissingField {
            operator: raw.operator.clone(),
            field,
        };
        let predicate = match raw.kind.as_str() {
            "number" => {
                if raw.operator == "between" {
                    Predicate::NumberBetween {
                        min: raw.min_value.ok_or_else(|| missing("minValue"))?,
                        max: raw.max_value.ok_or_else(|| missing("maxValue"))?,
                    }
                } else {
                    let op = Comparison::parse(&raw.operator).ok_or_else(|| {
                        FilterParseError::UnknownOperator {
                            kind: raw.kind.clone(),
                            operator: raw.operator.clone(),
                        }
                    })?;
                    let value = raw
                        .value
                        .as_ref()
                        .and_then(|v| v.as_f64())
                        .ok_or_else(|| missing("value"))?;
                    Predicate::NumberCompare { op, value }
                }
            }
            "string" => match raw.operator.as_str() {
                "in" => Predicate::StringIn(raw.values.clone().ok_or_else(|| missing("values"))?),
                "==" => Predicate::StringEquals(string_value(&raw).ok_or_else(|| missing("value"))?),
                "contains" => {
                    Predicate::StringContains(string_value(&raw).ok_or_else(|| missing("value"))?)
                }
                _ => {
                    return Err(FilterParseError::UnknownOperator {
                        kind: raw.kind,
                        operator: raw.operator,
                    });
                }
            },
            "bool" => Predicate::BoolEquals(
                raw.value
                    .as_ref()
                    .and_then(|v| v.as_bool())
                    .ok_or_else(|| missing("value"))?,
            ),
            other => return Err(FilterParseError::UnknownType(other.to_string())),
        };
        Ok(Filter {
            key: raw.key,
            name: raw.name,
            description: raw.description,
            enabled: raw.enabled,
            user_enabled: raw.user_enabled,
            interactable: raw.interactable,
            layers: raw.layers,
            predicate,
        })
    }
}

fn string_value(raw: &RawFilter) -> Option<String> {
    raw.value
        .as_ref()
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

impl From<Filter> for RawFilter {
    fn from(filter: Filter) -> Self {
        let (kind, operator, value, values, min_value, max_value) = match &filter.predicate {
            Predicate::NumberCompare { op, value } => (
                "number",
                op.as_str().to_string(),
                Some(serde_json::json!(value)),
                None,
                None,
                None,
            ),
            Predicate::NumberBetween { min, max } => (
                "number",
                "between".to_string(),
                None,
                None,
                Some(*min),
                Some(*max),
            ),
            Predicate::StringEquals(v) => (
                "string",
                "==".to_string(),
                Some(serde_json::json!(v)),
                None,
                None,
                None,
            ),
            Predicate::StringContains(v) => (
                "string",
                "contains".to_string(),
                Some(serde_json::json!(v)),
                None,
                None,
                None,
            ),
            Predicate::StringIn(values) => (
                "string",
                "in".to_string(),
                None,
                Some(values.clone()),
                None,
                None,
            ),
            Predicate::BoolEquals(v) => (
                "bool",
                "==".to_string(),
                Some(serde_json::json!(v)),
                None,
                None,
                None,
            ),
        };
        RawFilter {
            key: filter.key,
            name: filter.name,
            description: filter.description,
            kind: kind.to_string(),
            operator,
            value,
            values,
            min_value,
            max_value,
            enabled: filter.enabled,
            user_enabled: filter.user_enabled,
            interactable: filter.interactable,
            layers: filter.layers,
        }
    }
}

/// Scope of a color-exclusion filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnnotationScope {
    All,
    One(AnnotationType),
}

/// Per-layer, per-attribute exclusion rule: hide features whose value for
/// `key` is in `values`.
///
/// An entry never exists with an empty value set; removing the last value
/// removes the entry (enforced by the store's toggle).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorFilter {
    pub layer_id: LayerId,
    pub scope: AnnotationScope,
    pub key: String,
    pub values: BTreeSet<String>,
}
