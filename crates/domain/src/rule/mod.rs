//! Automation rules: condition → notification mappings.
//!
//! Rules arrive from the rule store as loosely-shaped JSON documents. They
//! are validated once, at ingestion, into an [`AutomationRule`]; a document
//! that fails validation never produces a watcher.

mod action;
pub mod compare;
pub mod condition;
mod schedule;
mod target;

pub use action::{Action, Notification};
pub use condition::{Condition, Operator, REALTIME_SOURCE};
pub use schedule::{Schedule, TimeUnit};
pub use target::Target;

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::id::RuleId;

/// A rule document as stored, before validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDocument {
    pub id: RuleId,
    pub data: Value,
}

impl RuleDocument {
    #[must_use]
    pub fn new(id: impl Into<RuleId>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// One entry of a rule change-feed batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleChange {
    Added(RuleDocument),
    Modified(RuleDocument),
    Removed(RuleId),
}

impl RuleChange {
    /// The rule this change applies to.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        match self {
            Self::Added(doc) | Self::Modified(doc) => &doc.id,
            Self::Removed(id) => id,
        }
    }
}

/// A validated, actionable automation rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationRule {
    pub action: Action,
    pub condition: Condition,
    pub target: Option<Target>,
    pub schedule: Option<Schedule>,
}

impl AutomationRule {
    /// Validate a raw rule document.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the document is not an object,
    /// the action is not a notification, the condition source is not the
    /// realtime store, or any of `path`, `operator` and `value` is missing.
    /// An explicit `null` value counts as present.
    pub fn from_document(data: &Value) -> Result<Self, ValidationError> {
        let doc = data
            .as_object()
            .ok_or_else(|| ValidationError::Malformed("expected a JSON object".to_string()))?;

        let action = parse_action(object(doc, "action")?)?;
        let condition = parse_condition(object(doc, "condition")?)?;

        let target = Target::select(
            string(doc, &["target_uid", "targetUid"]),
            string(doc, &["target_email", "targetEmail"]),
        );

        let schedule = doc.get("schedule").and_then(Value::as_object).and_then(|s| {
            Schedule::from_parts(
                s.get("unit").and_then(Value::as_str),
                s.get("interval"),
            )
        });

        Ok(Self {
            action,
            condition,
            target,
            schedule,
        })
    }

    /// Polling period for interval mode; `None` selects event mode.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.schedule.map(|s| s.period())
    }

    /// The notification to send when the rule fires.
    #[must_use]
    pub fn notification(&self) -> &Notification {
        match &self.action {
            Action::Notification(n) => n,
        }
    }
}

fn object<'a>(
    doc: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    doc.get(field)
        .and_then(Value::as_object)
        .ok_or(ValidationError::MissingField(field))
}

fn string<'a>(doc: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| doc.get(*key).and_then(Value::as_str))
}

fn required_string<'a>(
    doc: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

fn parse_action(action: &Map<String, Value>) -> Result<Action, ValidationError> {
    let kind = required_string(action, "type", "action.type")?;
    if kind != Action::NOTIFICATION {
        return Err(ValidationError::UnsupportedAction(kind.to_string()));
    }
    let payload = action.get("payload").and_then(Value::as_object);
    let field = |keys: &[&str]| {
        payload
            .and_then(|p| string(p, keys))
            .unwrap_or_default()
            .to_string()
    };
    Ok(Action::Notification(Notification {
        title: field(&["title"]),
        body: field(&["text", "body"]),
    }))
}

fn parse_condition(condition: &Map<String, Value>) -> Result<Condition, ValidationError> {
    let source = required_string(condition, "source", "condition.source")?;
    if source != REALTIME_SOURCE {
        return Err(ValidationError::UnsupportedSource(source.to_string()));
    }
    let path = required_string(condition, "path", "condition.path")?;
    let operator = required_string(condition, "operator", "condition.operator")?.parse()?;
    let value = condition
        .get("value")
        .cloned()
        .ok_or(ValidationError::MissingField("condition.value"))?;

    Ok(Condition {
        source: source.to_string(),
        path: path.to_string(),
        operator,
        value,
    })
}
