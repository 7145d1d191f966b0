//! Index construction from a live graph store
//!
//! Pulls every supported entity collection plus the relationship triples
//! out of the graph store and assembles a [`KeyValueIndex`] from them.
//! A store read failure aborts the build; per-query degradation is the
//! retrieval engines' concern, not the builder's.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::{GraphStore, RelationTriple, Result};
use crate::index::records::{EntityRecord, SUPPORTED_LABELS};
use crate::index::KeyValueIndex;

/// Builds a [`KeyValueIndex`] from the contents of a graph store
///
/// The builder reads, never writes: it walks the store label by label,
/// converts each node into its typed [`EntityRecord`], collects the
/// relationship triples, and hands everything to the index for keying
/// and deduplication.
pub struct IndexBuilder {
    store: Arc<dyn GraphStore>,
}

impl IndexBuilder {
    /// Create a builder over the given store
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Load all supported entity collections from the store
    ///
    /// Nodes whose label has no typed record shape are dropped with a
    /// debug log; a failed label query fails the whole load.
    pub async fn load_entity_records(&self) -> Result<Vec<EntityRecord>> {
        let mut records = Vec::new();

        for label in SUPPORTED_LABELS {
            let nodes = self.store.nodes_by_label(label).await?;
            let mut kept = 0usize;

            for node in &nodes {
                match EntityRecord::from_node(node) {
                    Some(record) => {
                        records.push(record);
                        kept += 1;
                    }
                    None => {
                        debug!(node_id = %node.node_id, label, "node does not fit its record shape");
                    }
                }
            }

            info!(label, loaded = kept, "loaded entity collection");
        }

        Ok(records)
    }

    /// Load every relationship triple from the store
    pub async fn load_relation_triples(&self) -> Result<Vec<RelationTriple>> {
        let triples = self.store.relationship_triples().await?;
        info!(triples = triples.len(), "loaded relationship triples");
        Ok(triples)
    }

    /// Build the complete index: entities, relations, then deduplication
    pub async fn build(&self) -> Result<KeyValueIndex> {
        info!("building key-value index from graph store");

        let records = self.load_entity_records().await?;
        let triples = self.load_relation_triples().await?;

        let mut index = KeyValueIndex::new();
        index.create_entity_key_values(&records);
        index.create_relation_key_values(&triples);
        index.deduplicate_entities_and_relations();

        let stats = index.get_statistics();
        info!(
            entities = stats.entity_count,
            relations = stats.relation_count,
            "key-value index built"
        );

        Ok(index)
    }
}
