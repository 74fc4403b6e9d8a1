//! Status-change broadcasting.
//!
//! Every lifecycle transition of every supervised process is re-published
//! here. Delivery is fire-and-forget: publishing never waits on a
//! subscriber, a lagging subscriber loses the oldest records, and late
//! subscribers get no replay.

use seerd_core::ProcessRecord;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for status records
pub const CHANNEL_CAPACITY: usize = 256;

/// Broadcaster for process status transitions
#[derive(Debug)]
pub struct StatusBroadcaster {
    sender: broadcast::Sender<ProcessRecord>,
}

impl StatusBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a record to all current subscribers
    pub fn publish(&self, record: ProcessRecord) {
        // Only log if there are receivers (avoid spam when nobody listens)
        if self.sender.receiver_count() > 0 {
            debug!(name = %record.name, state = %record.state, "Publishing status change");
            let _ = self.sender.send(record);
        }
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessRecord> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
