//! Automation log — append-only audit of rule firings.
//!
//! One [`AutomationLog`] is written per rule firing per event. It carries the
//! aggregate [`RuleStatus`] and the outcome of every action, in execution order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::DomainEvent;
use crate::id::{EventId, LogId, RuleId};
use crate::rule::{ActionConfig, ActionKind, AutomationRule};
use crate::time::{Timestamp, now};

/// Outcome of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Error,
    Timeout,
    /// Not attempted, e.g. the template is inactive.
    Skipped,
}

impl ActionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
        }
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Timeout)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate outcome of one rule firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Success,
    Partial,
    Error,
    Skipped,
}

impl RuleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    /// Worst-case status over the attempted actions.
    ///
    /// Skipped actions are ignored. Nothing attempted is `Skipped`, only
    /// successes is `Success`, only failures is `Error`, a mix is `Partial`.
    #[must_use]
    pub fn aggregate(results: &[ActionResult]) -> Self {
        let succeeded = results
            .iter()
            .filter(|r| r.status == ActionStatus::Success)
            .count();
        let failed = results.iter().filter(|r| r.status.is_failure()).count();
        match (succeeded, failed) {
            (0, 0) => Self::Skipped,
            (_, 0) => Self::Success,
            (0, _) => Self::Error,
            _ => Self::Partial,
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "partial" => Ok(Self::Partial),
            "error" => Ok(Self::Error),
            "skipped" => Ok(Self::Skipped),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// What happened to one action of a firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub order: u32,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub template_ref: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-fatal rendering warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl ActionResult {
    /// Start a result for `action` with the given status.
    #[must_use]
    pub fn new(action: &ActionConfig, status: ActionStatus) -> Self {
        Self {
            order: action.order,
            kind: action.kind,
            template_ref: action.template_ref.clone(),
            status,
            error: None,
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Audit row for one rule firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: LogId,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub event_id: EventId,
    pub event_type: String,
    pub executed_at: Timestamp,
    pub status: RuleStatus,
    pub action_results: Vec<ActionResult>,
    /// Rule-level failure, e.g. a condition that could not be evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AutomationLog {
    /// Log a firing whose actions were dispatched.
    #[must_use]
    pub fn fired(rule: &AutomationRule, event: &DomainEvent, results: Vec<ActionResult>) -> Self {
        Self {
            id: LogId::new(),
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            event_id: event.id,
            event_type: event.event_type.clone(),
            executed_at: now(),
            status: RuleStatus::aggregate(&results),
            action_results: results,
            error: None,
        }
    }

    /// Log a rule that failed before any action ran.
    #[must_use]
    pub fn failed(rule: &AutomationRule, event: &DomainEvent, error: impl Into<String>) -> Self {
        Self {
            id: LogId::new(),
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            event_id: event.id,
            event_type: event.event_type.clone(),
            executed_at: now(),
            status: RuleStatus::Error,
            action_results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Build a request, clamping to `page >= 1` and `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// A page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: ActionStatus) -> ActionResult {
        ActionResult::new(
            &ActionConfig::new(ActionKind::Email, "welcome", 0),
            status,
        )
    }

    #[test]
    fn should_aggregate_all_successes_as_success() {
        let results = vec![result(ActionStatus::Success), result(ActionStatus::Success)];
        assert_eq!(RuleStatus::aggregate(&results), RuleStatus::Success);
    }

    #[test]
    fn should_aggregate_mixed_outcomes_as_partial() {
        let results = vec![result(ActionStatus::Error), result(ActionStatus::Success)];
        assert_eq!(RuleStatus::aggregate(&results), RuleStatus::Partial);

        let results = vec![result(ActionStatus::Success), result(ActionStatus::Timeout)];
        assert_eq!(RuleStatus::aggregate(&results), RuleStatus::Partial);
    }

    #[test]
    fn should_aggregate_only_failures_as_error() {
        let results = vec![result(ActionStatus::Error), result(ActionStatus::Timeout)];
        assert_eq!(RuleStatus::aggregate(&results), RuleStatus::Error);
    }

    #[test]
    fn should_ignore_skipped_actions_when_aggregating() {
        let results = vec![result(ActionStatus::Skipped), result(ActionStatus::Success)];
        assert_eq!(RuleStatus::aggregate(&results), RuleStatus::Success);
        assert_eq!(
            RuleStatus::aggregate(&[result(ActionStatus::Skipped)]),
            RuleStatus::Skipped
        );
        assert_eq!(RuleStatus::aggregate(&[]), RuleStatus::Skipped);
    }

    #[test]
    fn should_parse_rule_status_names() {
        for status in [
            RuleStatus::Success,
            RuleStatus::Partial,
            RuleStatus::Error,
            RuleStatus::Skipped,
        ] {
            assert_eq!(status.as_str().parse::<RuleStatus>().unwrap(), status);
        }
        assert_eq!(
            "exploded".parse::<RuleStatus>(),
            Err(ValidationError::UnknownStatus("exploded".to_string()))
        );
    }

    #[test]
    fn should_clamp_page_request() {
        let request = PageRequest::new(0, 1_000);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, PageRequest::MAX_PER_PAGE);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn should_record_rule_error_without_actions() {
        let rule = AutomationRule::builder()
            .name("Broken")
            .event_type("user.signup")
            .build()
            .unwrap();
        let event = DomainEvent::new("user.signup", serde_json::json!({}));
        let log = AutomationLog::failed(&rule, &event, "condition tree is too deep");
        assert_eq!(log.status, RuleStatus::Error);
        assert_eq!(log.rule_id, rule.id);
        assert_eq!(log.event_id, event.id);
        assert!(log.action_results.is_empty());
    }
}
