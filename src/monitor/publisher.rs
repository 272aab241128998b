//! Snapshot hand-off between the poll task and readers
//!
//! The writer swaps a whole `Arc<Snapshot>` under a short write lock; readers
//! clone the `Arc` under a read lock and keep it as long as they like. A
//! reader therefore holds either the previous or the new snapshot in full.

use std::sync::Arc;

use parking_lot::RwLock;

use super::Snapshot;

/// Write side, owned by the cluster's aggregator
#[derive(Debug)]
pub struct SnapshotPublisher {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

/// Cloneable read side handed to the render layer
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotPublisher {
    pub fn new(initial: Snapshot) -> Self {
        SnapshotPublisher {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Replace the published snapshot
    pub fn publish(&self, snapshot: Snapshot) {
        let next = Arc::new(snapshot);
        *self.current.write() = next;
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            current: self.current.clone(),
        }
    }

    /// Latest published snapshot
    pub fn latest(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }
}

impl SnapshotReader {
    /// Latest published snapshot
    pub fn latest(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }
}
