//! Key-value indexing over the travel knowledge graph
//!
//! The index is the foundation every lexical retrieval layer queries:
//! entity names map to rendered entity descriptions, relationship types
//! and topic labels map to relationship descriptions. A build pass scans
//! the graph store once; afterwards all lookups are pure in-memory reads.
//!
//! Rebuilds replace the index wholesale. [`SharedIndex`] provides the
//! swap point: queries running during a rebuild keep the snapshot they
//! started with and never observe a partially populated store.

pub mod builder;
pub mod key_value;
pub mod records;

use std::sync::Arc;

use parking_lot::RwLock;

pub use builder::IndexBuilder;
pub use key_value::{
    topic_label, EntityKeyValue, IndexStatistics, KeyValueIndex, RelationKeyValue,
};
pub use records::{EntityRecord, SUPPORTED_LABELS};

/// Cloneable handle to the current index snapshot
///
/// Readers call [`SharedIndex::snapshot`] and work against that `Arc`
/// for the rest of their query. [`SharedIndex::replace`] installs a new
/// index atomically; in-flight readers keep the old snapshot alive until
/// they drop it.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<KeyValueIndex>>>,
}

impl SharedIndex {
    /// Wrap a freshly built index
    pub fn new(index: KeyValueIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Handle holding an empty index, useful before the first build
    pub fn empty() -> Self {
        Self::new(KeyValueIndex::new())
    }

    /// The current index snapshot
    pub fn snapshot(&self) -> Arc<KeyValueIndex> {
        Arc::clone(&self.inner.read())
    }

    /// Install a rebuilt index, replacing the old one wholesale
    pub fn replace(&self, index: KeyValueIndex) {
        let mut guard = self.inner.write();
        *guard = Arc::new(index);
        tracing::info!("index snapshot replaced");
    }
}

impl Default for SharedIndex {
    fn default() -> Self {
        Self::empty()
    }
}
