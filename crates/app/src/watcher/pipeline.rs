//! Evaluation pipeline: what a watcher does with one observed value.

use std::time::Instant;

use alerthub_domain::id::RuleId;
use alerthub_domain::rule::AutomationRule;
use alerthub_domain::throttle::Throttle;
use serde_json::Value;

use crate::ports::{PushSender, UserDirectory};
use crate::services::{DispatchReport, NotificationDispatcher, TargetResolver};

/// Result of running one observation through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The condition does not hold.
    Idle,
    /// The condition holds but the rule fired too recently.
    Throttled,
    /// The condition holds but the target has no device to notify.
    NoTargets,
    /// Notifications were sent.
    Dispatched(DispatchReport),
}

/// Condition check, throttle, target resolution and dispatch.
pub struct Pipeline<UD, PS> {
    resolver: TargetResolver<UD>,
    dispatcher: NotificationDispatcher<PS>,
}

impl<UD: UserDirectory, PS: PushSender> Pipeline<UD, PS> {
    /// Create a pipeline resolving targets in `users` and sending through `sender`.
    pub fn new(users: UD, sender: PS) -> Self {
        Self {
            resolver: TargetResolver::new(users),
            dispatcher: NotificationDispatcher::new(sender),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &NotificationDispatcher<PS> {
        &self.dispatcher
    }

    /// Evaluate `rule` against `current`, observed at `observed_at`.
    ///
    /// The throttle, when given, is only consumed once tokens were resolved
    /// and a dispatch was attempted.
    pub async fn run(
        &self,
        rule_id: &RuleId,
        rule: &AutomationRule,
        current: &Value,
        throttle: Option<&mut Throttle>,
        observed_at: Instant,
    ) -> Outcome {
        if !rule.condition.matches(current) {
            tracing::debug!(%rule_id, %current, "condition not met");
            return Outcome::Idle;
        }
        if throttle.as_deref().is_some_and(|t| !t.ready(observed_at)) {
            tracing::debug!(%rule_id, "throttled");
            return Outcome::Throttled;
        }

        let tokens = self.resolver.resolve(rule.target.as_ref()).await;
        if tokens.is_empty() {
            tracing::warn!(%rule_id, target = ?rule.target, "no device tokens for rule target");
            return Outcome::NoTargets;
        }

        let report = self.dispatcher.dispatch(&tokens, rule.notification()).await;
        if let Some(throttle) = throttle {
            throttle.record(observed_at);
        }
        tracing::info!(
            %rule_id,
            sent = report.sent,
            failed = report.failed,
            "rule fired"
        );
        Outcome::Dispatched(report)
    }
}
