//! Domain event — one occurrence of a catalogued event type.
//!
//! Events are raised by domain code and handed to the event bus. This crate
//! never persists them; only the effects of processing them are audited.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};

/// Something that happened on the platform, with the data it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: EventId,
    /// Catalog key, e.g. `"user.signup"`.
    pub event_type: String,
    /// Arbitrary JSON tree the rules and templates read from.
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl DomainEvent {
    /// Create a new event that occurred now.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::at(event_type, payload, now())
    }

    /// Create a new event with an explicit occurrence time.
    #[must_use]
    pub fn at(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            payload,
            occurred_at,
        }
    }
}
