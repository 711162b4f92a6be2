//! Sender ports — one trait per delivery channel.
//!
//! Senders own transport concerns, retries included. The dispatcher only sees
//! whether a single `send` succeeded.

use std::future::Future;
use std::sync::Arc;

use herald_domain::notification::{
    ChatMessage, EmailMessage, Notification, PushMessage, WebhookMessage,
};

/// A channel refused or failed to deliver a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery failed: {reason}")]
pub struct DeliveryError {
    pub reason: String,
}

impl DeliveryError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub trait EmailSender {
    fn send(
        &self,
        message: EmailMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

pub trait PushSender {
    fn send(&self, message: PushMessage) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Chat messaging channel (WhatsApp).
pub trait ChatSender {
    fn send(&self, message: ChatMessage) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

pub trait WebhookSender {
    fn send(
        &self,
        message: WebhookMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Delivers any [`Notification`] to the sender of its channel.
pub trait NotificationSender {
    fn deliver(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

impl<T: NotificationSender + Send + Sync> NotificationSender for Arc<T> {
    fn deliver(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        (**self).deliver(notification)
    }
}

/// Routes notifications to one sender per channel.
#[derive(Debug, Clone)]
pub struct ChannelSenders<E, P, C, W> {
    pub email: E,
    pub push: P,
    pub chat: C,
    pub webhook: W,
}

impl<E, P, C, W> NotificationSender for ChannelSenders<E, P, C, W>
where
    E: EmailSender + Sync,
    P: PushSender + Sync,
    C: ChatSender + Sync,
    W: WebhookSender + Sync,
{
    fn deliver(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        async move {
            match notification {
                Notification::Email(message) => self.email.send(message).await,
                Notification::Push(message) => self.push.send(message).await,
                Notification::Whatsapp(message) => self.chat.send(message).await,
                Notification::Webhook(message) => self.webhook.send(message).await,
            }
        }
    }
}
