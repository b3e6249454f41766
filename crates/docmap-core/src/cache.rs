//! In-memory cache of aggregated docmaps, keyed by version label.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::docmap::DocmapIndex;

/// Version label used by [`crate::Docmap::read`].
pub const CURRENT_VERSION: &str = "current";

/// Shared cache of aggregation results. Entries are never evicted.
#[derive(Debug, Default)]
pub struct DocmapCache {
    entries: Mutex<HashMap<String, Arc<DocmapIndex>>>,
}

impl DocmapCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached index for `version`, if any.
    #[must_use]
    pub fn get(&self, version: &str) -> Option<Arc<DocmapIndex>> {
        self.entries.lock().get(version).cloned()
    }

    /// Store `index` under `version`, replacing any previous value.
    pub fn insert(&self, version: impl Into<String>, index: Arc<DocmapIndex>) {
        self.entries.lock().insert(version.into(), index);
    }

    /// Drop every cached index.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
