pub mod classifier;
pub mod error;
pub mod ingest;
pub mod sensor;

pub use error::{IngestError, ParseError, Result, StartupError};

use std::sync::{Arc, RwLock};

use cropsense_model::{DashboardRecord, Snapshot};

/// Convenience helper for passing the latest value between threads. For example from a thread
/// interfacing with a sensor to the handlers serving it.
///
/// Writers replace the whole value, readers get a cheap `Arc` clone of whatever was last stored,
/// so a reader never sees half of an update.
#[derive(Debug, Default)]
pub struct ValueStore<T>(Arc<RwLock<Arc<T>>>);

impl<T> Clone for ValueStore<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> ValueStore<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(value))))
    }

    /// Replaces the stored value with whatever `update` derives from the current one.
    pub fn update(&self, update: impl FnOnce(&T) -> T) -> Arc<T> {
        let mut data = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = Arc::new(update(&data));
        *data = Arc::clone(&next);
        next
    }

    /// Gets the stored value. Never blocks on anything but a pointer swap.
    pub fn get(&self) -> Arc<T> {
        let data = self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&data)
    }
}

/// The store shared between the ingest loop (single writer) and the query surface.
pub type SnapshotStore = ValueStore<Snapshot>;

impl SnapshotStore {
    /// Publishes `record` as the successor of the current snapshot.
    pub fn publish(&self, record: DashboardRecord) -> Arc<Snapshot> {
        self.update(|current| current.next(record))
    }

    pub fn record(&self) -> DashboardRecord {
        self.get().record.clone()
    }
}
