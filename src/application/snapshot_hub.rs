use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::task::Snapshot;

const HUB_CAPACITY: usize = 64;

/// Fan-out of published snapshots to every live subscriber.
#[derive(Clone)]
pub struct SnapshotHub {
    sender: broadcast::Sender<Arc<Snapshot>>,
    subscribers: Arc<AtomicUsize>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender, subscribers: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        let count = self.subscribers.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(subscribers = count, "subscriber added");
        SnapshotReceiver { inner: self.sender.subscribe(), subscribers: Arc::clone(&self.subscribers) }
    }

    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        let version = snapshot.version;
        match self.sender.send(snapshot) {
            Ok(receivers) => debug!(version, receivers, "snapshot published"),
            Err(_) => debug!(version, "snapshot published with no subscribers"),
        }
    }
}

impl Default for SnapshotHub {
    fn default() -> Self { Self::new() }
}

pub struct SnapshotReceiver {
    inner: broadcast::Receiver<Arc<Snapshot>>,
    subscribers: Arc<AtomicUsize>,
}

impl SnapshotReceiver {
    /// Next snapshot, or `None` once the hub is gone.
    ///
    /// A lagging receiver skips straight to the newest snapshot; every
    /// snapshot carries the full collection so nothing is lost.
    pub async fn recv(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            match self.inner.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, skipping to latest snapshot");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for SnapshotReceiver {
    fn drop(&mut self) {
        let count = self.subscribers.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(subscribers = count, "subscriber removed");
    }
}
