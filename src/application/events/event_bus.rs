//! Domain event publishing
//!
//! Mutating operations publish events on a broadcast bus the embedding
//! application constructs and subscribes to (e.g. to refresh UI views).
//! The core itself registers no listeners; a publish without subscribers
//! is a no-op.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by the billing core
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ExecutionStarted {
        execution_id: Uuid,
        device_id: i32,
        user_id: Uuid,
    },
    ExecutionFinished {
        execution_id: Uuid,
        user_id: Uuid,
        price: Decimal,
    },
    ExecutionExpired {
        execution_id: Uuid,
    },
    ExecutionDeleted {
        execution_id: Uuid,
    },
    CreditChanged {
        user_id: Uuid,
        balance: Decimal,
    },
}

/// Cloneable handle on the broadcast event channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}

pub fn create_event_bus(capacity: usize) -> EventBus {
    EventBus::new(capacity)
}
