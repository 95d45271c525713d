// Naming Event Bus - Pub/Sub for naming change records
//
// Provides in-memory event streaming using tokio broadcast channels so that
// async observers (CLI watchers, audit sinks) can follow naming changes
// without registering a synchronous listener.
//
// In-memory only: records are lost when the store is torn down.

use crate::domain::events::NamingEventRecord;
use crate::domain::name::Name;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus for publishing and subscribing to naming event records
#[derive(Clone)]
pub struct NamingEventBus {
    sender: Arc<broadcast::Sender<NamingEventRecord>>,
}

impl NamingEventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many records can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish a record to all subscribers
    pub fn publish(&self, record: NamingEventRecord) {
        // send() fails only when nobody is subscribed
        let receiver_count = self.sender.send(record).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to naming event");
        }
    }

    /// Subscribe to all naming event records
    pub fn subscribe(&self) -> NamingEventReceiver {
        NamingEventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe and filter for records at or below `prefix`
    pub fn subscribe_subtree(&self, prefix: Name) -> SubtreeEventReceiver {
        SubtreeEventReceiver {
            receiver: self.sender.subscribe(),
            prefix,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Naming event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all naming event records
pub struct NamingEventReceiver {
    receiver: broadcast::Receiver<NamingEventRecord>,
}

impl NamingEventReceiver {
    /// Receive the next record (waits until one is available)
    pub async fn recv(&mut self) -> Result<NamingEventRecord, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive a record without waiting
    pub fn try_recv(&mut self) -> Result<NamingEventRecord, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Naming event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver for records inside one subtree (filtered)
pub struct SubtreeEventReceiver {
    receiver: broadcast::Receiver<NamingEventRecord>,
    prefix: Name,
}

impl SubtreeEventReceiver {
    /// Receive the next record whose name lies under the prefix
    pub async fn recv(&mut self) -> Result<NamingEventRecord, EventBusError> {
        loop {
            let record = self.receiver.recv().await.map_err(map_recv_error)?;
            if record.name.starts_with(&self.prefix) {
                return Ok(record);
            }
        }
    }
}

/// Errors that can occur when receiving records
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for NamingEventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
