//! Port interfaces for shipping activity to the remote service

use async_trait::async_trait;
use codetrail_domain::{ActivityInfo, Result};

use crate::tracking::ActivityBatch;

/// Converts drained batches into the wire representation.
pub trait ActivityEncoder: Send + Sync {
    fn encode(&self, batch: &ActivityBatch) -> ActivityInfo;
}

/// Outcome of forwarding one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// Transient failure; keep the batch and try again next cycle.
    Retry(String),
    /// Permanent failure; keeping the batch would not help.
    Discard(String),
}

/// Posts serialized batches.
#[async_trait]
pub trait ActivityForwarder: Send + Sync {
    async fn forward(&self, activity: &ActivityInfo) -> Delivery;
}

/// A batch persisted in the cache, addressed by `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedActivity {
    pub key: String,
    pub activity: ActivityInfo,
}

/// Local history of sent batches and cache of unsent ones.
pub trait ActivityArchive: Send + Sync {
    fn save_history(&self, activity: &ActivityInfo) -> Result<()>;

    fn save_cache(&self, activity: &ActivityInfo) -> Result<()>;

    /// Cached batches, oldest first.
    fn cached(&self) -> Result<Vec<ArchivedActivity>>;

    fn remove_cached(&self, key: &str) -> Result<()>;
}
