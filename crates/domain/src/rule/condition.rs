//! Condition: the comparison a rule applies to an observed value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::compare::{compare, loose_eq};
use crate::error::ValidationError;

/// Source tag identifying the realtime key-value store.
pub const REALTIME_SOURCE: &str = "rtdb";

/// Comparison operator between the observed value and the rule's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    /// Symbol as written in rule documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Apply the operator to `current` (left) and `target` (right).
    ///
    /// Total over any pair of JSON values: equality is loose, ordering is
    /// numeric unless both sides are strings, and incomparable pairs are
    /// simply `false`.
    #[must_use]
    pub fn apply(self, current: &Value, target: &Value) -> bool {
        match self {
            Self::Eq => loose_eq(current, target),
            Self::Ne => !loose_eq(current, target),
            Self::Gt => compare(current, target) == Some(Ordering::Greater),
            Self::Lt => compare(current, target) == Some(Ordering::Less),
            Self::Ge => matches!(
                compare(current, target),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Le => matches!(
                compare(current, target),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            other => Err(ValidationError::UnknownOperator(other.to_string())),
        }
    }
}

/// Evaluate `current <operator> target` from a raw operator string.
///
/// An unrecognized operator fails closed and yields `false`.
#[must_use]
pub fn evaluate(current: &Value, operator: &str, target: &Value) -> bool {
    operator
        .parse::<Operator>()
        .is_ok_and(|op| op.apply(current, target))
}

/// A validated rule condition watching one realtime-store path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub source: String,
    pub path: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    /// Whether the observed value satisfies this condition.
    #[must_use]
    pub fn matches(&self, current: &Value) -> bool {
        self.operator.apply(current, &self.value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} {}", self.source, self.path, self.operator, self.value)
    }
}
