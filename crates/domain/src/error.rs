//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HeraldError`] via `#[from]`.

use crate::rule::ConditionError;

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The backing store failed. Adapters box their own error type here.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations detected before anything is persisted or executed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("event type {0:?} is not registered in the catalog")]
    UnknownEventType(String),

    #[error("event type {0:?} is declared more than once")]
    DuplicateEventType(String),

    #[error("action order {0} is used more than once")]
    DuplicateActionOrder(u32),

    #[error("action with order {order} has an empty template reference")]
    EmptyTemplateRef { order: u32 },

    #[error("webhook action with order {order} needs a recipient url")]
    MissingRecipient { order: u32 },

    #[error("invalid condition")]
    InvalidCondition(#[from] ConditionError),

    #[error("template slug must not be empty")]
    EmptyTemplateSlug,

    #[error("template body must not be empty")]
    EmptyTemplateBody,

    #[error("unknown action kind {0:?}")]
    UnknownActionKind(String),

    #[error("unknown rule status {0:?}")]
    UnknownStatus(String),

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
