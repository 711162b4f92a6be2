//! Event bus port — fire-and-forget emission of domain events.

use herald_domain::id::EventId;

/// Entry point used by domain code to raise an event.
///
/// Emission never blocks and never fails towards the caller: events that
/// cannot be queued are dropped with a diagnostic.
pub trait EventEmitter {
    /// Queue `payload` as an occurrence of `event_type`.
    ///
    /// Returns the id of the queued event, or `None` when it was dropped.
    fn emit(&self, event_type: &str, payload: serde_json::Value) -> Option<EventId>;
}

impl<T: EventEmitter + ?Sized> EventEmitter for std::sync::Arc<T> {
    fn emit(&self, event_type: &str, payload: serde_json::Value) -> Option<EventId> {
        (**self).emit(event_type, payload)
    }
}
