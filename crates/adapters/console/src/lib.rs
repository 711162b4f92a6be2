//! # herald-adapter-console
//!
//! Senders for every channel that write the rendered notification to the
//! log instead of delivering it. Useful in development and demos, where the
//! interesting part is what the rule engine rendered, not the transport.
//!
//! | Channel | Logged fields |
//! |---------|---------------|
//! | email | `to`, `subject`, `html` |
//! | push | `subscription`, `title`, `body`, `icon`, `url`, `tag` |
//! | whatsapp | `to`, `body` |
//! | webhook | `url`, `body` |
//!
//! ## Dependency rule
//!
//! Depends on `herald-app` (port traits) and `herald-domain` only.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald_app::ports::{
    ChannelSenders, ChatSender, DeliveryError, EmailSender, PushSender, WebhookSender,
};
use herald_domain::notification::{ChatMessage, EmailMessage, PushMessage, WebhookMessage};

/// Logs notifications on every channel.
///
/// Clones share the delivery counter.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSender {
    delivered: Arc<AtomicU64>,
}

impl ConsoleSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One console sender per channel, all sharing this sender's counter.
    #[must_use]
    pub fn channels(&self) -> ChannelSenders<Self, Self, Self, Self> {
        ChannelSenders {
            email: self.clone(),
            push: self.clone(),
            chat: self.clone(),
            webhook: self.clone(),
        }
    }

    /// Number of messages written so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    fn accept(&self, channel: &'static str, recipient: &str) -> Result<(), DeliveryError> {
        if recipient.trim().is_empty() {
            return Err(DeliveryError::new(format!("{channel} recipient is empty")));
        }
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl EmailSender for ConsoleSender {
    fn send(
        &self,
        message: EmailMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        async move {
            self.accept("email", &message.to)?;
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                html = %message.html,
                "email"
            );
            Ok(())
        }
    }
}

impl PushSender for ConsoleSender {
    fn send(&self, message: PushMessage) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        async move {
            self.accept("push", &message.subscription)?;
            tracing::info!(
                subscription = %message.subscription,
                title = %message.title,
                body = %message.body,
                icon = ?message.icon,
                url = ?message.url,
                tag = %message.tag,
                "push"
            );
            Ok(())
        }
    }
}

impl ChatSender for ConsoleSender {
    fn send(&self, message: ChatMessage) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        async move {
            self.accept("whatsapp", &message.to)?;
            tracing::info!(to = %message.to, body = %message.body, "whatsapp");
            Ok(())
        }
    }
}

impl WebhookSender for ConsoleSender {
    fn send(
        &self,
        message: WebhookMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        async move {
            self.accept("webhook", &message.url)?;
            tracing::info!(url = %message.url, body = %message.body, "webhook");
            Ok(())
        }
    }
}
