//! Rendered, channel-specific messages handed to senders.

use serde::{Deserialize, Serialize};

use crate::rule::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Opaque push subscription handle of the recipient device.
    pub subscription: String,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub url: Option<String>,
    /// Collapses notifications of the same kind on the device.
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub url: String,
    pub body: String,
}

/// A fully rendered message for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum Notification {
    Email(EmailMessage),
    Push(PushMessage),
    Whatsapp(ChatMessage),
    Webhook(WebhookMessage),
}

impl Notification {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Email(_) => ActionKind::Email,
            Self::Push(_) => ActionKind::Push,
            Self::Whatsapp(_) => ActionKind::Whatsapp,
            Self::Webhook(_) => ActionKind::Webhook,
        }
    }

    /// Address, subscription or url the message goes to.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self {
            Self::Email(m) => &m.to,
            Self::Push(m) => &m.subscription,
            Self::Whatsapp(m) => &m.to,
            Self::Webhook(m) => &m.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_kind_and_recipient() {
        let n = Notification::Whatsapp(ChatMessage {
            to: "+5511999990000".to_string(),
            body: "Oi".to_string(),
        });
        assert_eq!(n.kind(), ActionKind::Whatsapp);
        assert_eq!(n.recipient(), "+5511999990000");
    }

    #[test]
    fn should_tag_serialized_notification_with_channel() {
        let n = Notification::Email(EmailMessage {
            to: "r@x.com".to_string(),
            subject: "Limit".to_string(),
            html: "<p>Hi</p>".to_string(),
        });
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["channel"], "email");
        assert_eq!(json["to"], "r@x.com");
    }
}
