//! Action — one notification step fired when a rule matches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Delivery channel of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Email,
    Push,
    Whatsapp,
    Webhook,
}

impl ActionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Push => "push",
            Self::Whatsapp => "whatsapp",
            Self::Webhook => "webhook",
        }
    }

    /// Recipient template used when an action does not set one.
    ///
    /// Webhooks have no sensible default: the target URL must be explicit.
    #[must_use]
    pub fn default_recipient(self) -> Option<&'static str> {
        match self {
            Self::Email => Some("{{user.email}}"),
            Self::Push => Some("{{user.push_subscription}}"),
            Self::Whatsapp => Some("{{user.phone}}"),
            Self::Webhook => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            "whatsapp" => Ok(Self::Whatsapp),
            "webhook" => Ok(Self::Webhook),
            other => Err(ValidationError::UnknownActionKind(other.to_string())),
        }
    }
}

/// Configuration of a single action inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Slug of the channel template to render.
    pub template_ref: String,
    /// Execution position inside the rule, unique per rule.
    pub order: u32,
    /// Recipient template, e.g. `"{{user.email}}"` or a webhook URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl ActionConfig {
    #[must_use]
    pub fn new(kind: ActionKind, template_ref: impl Into<String>, order: u32) -> Self {
        Self {
            kind,
            template_ref: template_ref.into(),
            order,
            recipient: None,
        }
    }

    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// The recipient template to render, falling back to the channel default.
    #[must_use]
    pub fn recipient_template(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .or_else(|| self.kind.default_recipient())
    }
}

impl fmt::Display for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}({})", self.kind, self.order, self.template_ref)
    }
}

/// Sort actions by `order`, keeping array position for equal orders.
#[must_use]
pub fn in_execution_order(actions: &[ActionConfig]) -> Vec<&ActionConfig> {
    let mut sorted: Vec<&ActionConfig> = actions.iter().collect();
    sorted.sort_by_key(|action| action.order);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_order_actions_by_order_field_not_position() {
        let actions = vec![
            ActionConfig::new(ActionKind::Email, "welcome", 1),
            ActionConfig::new(ActionKind::Push, "welcome", 0),
        ];
        let sorted = in_execution_order(&actions);
        assert_eq!(sorted[0].kind, ActionKind::Push);
        assert_eq!(sorted[1].kind, ActionKind::Email);
    }

    #[test]
    fn should_keep_array_position_on_equal_orders() {
        let actions = vec![
            ActionConfig::new(ActionKind::Whatsapp, "first", 2),
            ActionConfig::new(ActionKind::Email, "second", 2),
            ActionConfig::new(ActionKind::Push, "zero", 0),
        ];
        let sorted: Vec<_> = in_execution_order(&actions)
            .into_iter()
            .map(|a| a.template_ref.as_str())
            .collect();
        assert_eq!(sorted, vec!["zero", "first", "second"]);
    }

    #[test]
    fn should_fall_back_to_channel_default_recipient() {
        let email = ActionConfig::new(ActionKind::Email, "welcome", 0);
        assert_eq!(email.recipient_template(), Some("{{user.email}}"));

        let custom = email.with_recipient("{{manager.email}}");
        assert_eq!(custom.recipient_template(), Some("{{manager.email}}"));

        let webhook = ActionConfig::new(ActionKind::Webhook, "crm", 0);
        assert_eq!(webhook.recipient_template(), None);
    }

    #[test]
    fn should_deserialize_action_with_type_tag() {
        let json = serde_json::json!({"type": "whatsapp", "template_ref": "limit-reached", "order": 3});
        let action: ActionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(action.kind, ActionKind::Whatsapp);
        assert_eq!(action.order, 3);
        assert!(action.recipient.is_none());
    }

    #[test]
    fn should_reject_unknown_action_kind() {
        let json = serde_json::json!({"type": "sms", "template_ref": "x", "order": 0});
        assert!(serde_json::from_value::<ActionConfig>(json).is_err());
        assert_eq!(
            "sms".parse::<ActionKind>().unwrap_err(),
            ValidationError::UnknownActionKind("sms".to_string())
        );
    }

    #[test]
    fn should_display_action_summary() {
        let action = ActionConfig::new(ActionKind::Email, "limit-reached", 0);
        assert_eq!(action.to_string(), "email#0(limit-reached)");
    }
}
