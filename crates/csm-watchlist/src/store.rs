//! # Watchlist Store
//!
//! Holds the currently published [`WatchlistIndex`] and swaps it atomically
//! on refresh.
//!
//! ## Snapshot discipline
//!
//! Readers call [`WatchlistStore::snapshot`] once per operation and work
//! against the returned `Arc` for the whole operation. [`publish`] replaces
//! the pointer under a brief write lock; an index that readers still hold
//! stays alive until the last `Arc` is dropped. No reader ever sees a
//! half-built index, and a publish never waits for a lookup to finish.
//!
//! [`publish`]: WatchlistStore::publish

use std::sync::Arc;

use parking_lot::RwLock;

use csm_core::{CsmError, WatchlistVersion};

use crate::index::WatchlistIndex;

/// Thread-safe, cloneable holder of the current watchlist snapshot.
///
/// The lock guards only the `Arc` swap; it is never held during a lookup.
#[derive(Debug, Clone, Default)]
pub struct WatchlistStore {
    current: Arc<RwLock<Option<Arc<WatchlistIndex>>>>,
}

impl WatchlistStore {
    /// Create a store with nothing published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `index` as the current snapshot. Returns the snapshot it
    /// replaced, if any.
    pub fn publish(&self, index: WatchlistIndex) -> Option<Arc<WatchlistIndex>> {
        let next = Arc::new(index);
        let version = next.version().clone();
        let previous = self.current.write().replace(next);
        tracing::info!(
            version = %version,
            previous = previous.as_ref().map(|p| p.version().to_string()).unwrap_or_default(),
            "watchlist snapshot published"
        );
        previous
    }

    /// The current snapshot.
    ///
    /// # Errors
    ///
    /// [`CsmError::IndexUnavailable`] before the first publish.
    pub fn snapshot(&self) -> Result<Arc<WatchlistIndex>, CsmError> {
        self.current.read().clone().ok_or(CsmError::IndexUnavailable)
    }

    /// Version of the current snapshot, if one is published.
    pub fn current_version(&self) -> Option<WatchlistVersion> {
        self.current.read().as_ref().map(|i| i.version().clone())
    }
}
