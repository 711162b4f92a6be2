//! In-process event bus backed by a bounded tokio mpsc channel.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use herald_domain::catalog::EventCatalog;
use herald_domain::event::DomainEvent;
use herald_domain::id::EventId;

use crate::ports::EventEmitter;

/// Publishing side of the bus. Cheap to clone.
///
/// Emission only checks the catalog and tries to enqueue; processing happens
/// on the worker pool draining the matching [`EventReceiver`].
#[derive(Debug, Clone)]
pub struct EventBus {
    catalog: Arc<EventCatalog>,
    sender: mpsc::Sender<DomainEvent>,
}

/// Consuming side of the bus, owned by the worker pool.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::Receiver<DomainEvent>,
}

impl EventBus {
    /// Create a bus holding at most `capacity` pending events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(catalog: Arc<EventCatalog>, capacity: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { catalog, sender }, EventReceiver { receiver })
    }

    #[must_use]
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Queue an already built event.
    ///
    /// Returns `false` when the event was dropped.
    pub fn publish(&self, event: DomainEvent) -> bool {
        if !self.catalog.contains(&event.event_type) {
            tracing::warn!(
                event_type = %event.event_type,
                event_id = %event.id,
                "dropping event of unregistered type"
            );
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "event queue is full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "event bus is shut down, dropping event"
                );
                false
            }
        }
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event_type: &str, payload: serde_json::Value) -> Option<EventId> {
        let event = DomainEvent::new(event_type, payload);
        let id = event.id;
        self.publish(event).then_some(id)
    }
}

impl EventReceiver {
    /// Wait for the next event. `None` once every [`EventBus`] handle is dropped
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.receiver.recv().await
    }
}
