//! Entity/relation key-value index
//!
//! Converts raw graph entities and relationship triples into a
//! searchable key-to-text structure so retrieval does not pay the graph
//! store's query latency on every lookup. Stores are `IndexMap`s keyed
//! by id, so iteration order is insertion order and test output stays
//! deterministic.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::core::{NodeId, RelationId, RelationTriple};
use crate::index::records::EntityRecord;

/// Derived index entry for a single entity
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntityKeyValue {
    /// Display name, also the primary index key
    pub entity_name: String,
    /// Keys under which this entry is discoverable
    pub index_keys: Vec<String>,
    /// Pre-rendered multi-line description for LLM consumption
    pub value_content: String,
    /// Entity type tag (City, Attraction, ...)
    pub entity_type: String,
    /// At least `node_id` plus a snapshot of the raw properties
    pub metadata: HashMap<String, String>,
}

impl EntityKeyValue {
    /// The graph node id recorded in the entry metadata
    pub fn node_id(&self) -> NodeId {
        NodeId::new(
            self.metadata
                .get("node_id")
                .cloned()
                .unwrap_or_default(),
        )
    }
}

/// Derived index entry for a single relationship
///
/// `source_entity` and `target_entity` are weak references into the
/// entity store. Entries whose endpoints no longer resolve are treated
/// as orphaned and excluded from topic-level results.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RelationKeyValue {
    /// Generated unique identifier
    pub relation_id: RelationId,
    /// Keys under which this entry is discoverable
    pub index_keys: Vec<String>,
    /// Short natural-language description of the relationship
    pub value_content: String,
    /// Relationship type tag (e.g. "HAS_ATTRACTION")
    pub relation_type: String,
    /// Source node id
    pub source_entity: NodeId,
    /// Target node id
    pub target_entity: NodeId,
    /// Free-form metadata
    pub metadata: HashMap<String, String>,
}

/// Broader topic key for a relationship type, when one is defined
///
/// Topic keys let thematic queries like 景点 or 美食 reach relation
/// entries without knowing the raw relationship type tag.
pub fn topic_label(relation_type: &str) -> Option<&'static str> {
    match relation_type {
        "HAS_ATTRACTION" => Some("景点"),
        "HAS_FOOD" => Some("美食"),
        "HAS_HOTEL" => Some("住宿"),
        "HAS_SPECIALTY" => Some("特产"),
        "HAS_FESTIVAL" => Some("节庆"),
        "NEARBY" => Some("周边"),
        "LOCATED_IN" => Some("位置"),
        _ => None,
    }
}

/// Aggregate counts over the built index
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexStatistics {
    /// Entities indexed after filtering malformed records
    pub entity_count: usize,
    /// Relations indexed after orphan exclusion and deduplication
    pub relation_count: usize,
    /// Entity counts grouped by entity type
    pub entities_by_type: IndexMap<String, usize>,
    /// Relation counts grouped by relationship type
    pub relations_by_type: IndexMap<String, usize>,
    /// Distinct entity index keys
    pub key_count_entities: usize,
    /// Distinct relation index keys
    pub key_count_relations: usize,
    /// When this index instance was created
    pub built_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory key-value index over travel entities and relations
///
/// Built once per index-construction pass and then queried read-only.
/// A rebuild produces a fresh instance; [`super::SharedIndex`] provides
/// the atomic wholesale swap between the old and new instance.
#[derive(Debug, Clone)]
pub struct KeyValueIndex {
    entities: IndexMap<NodeId, EntityKeyValue>,
    relations: IndexMap<RelationId, RelationKeyValue>,
    key_to_entities: IndexMap<String, Vec<NodeId>>,
    key_to_relations: IndexMap<String, Vec<RelationId>>,
    built_at: chrono::DateTime<chrono::Utc>,
}

impl Default for KeyValueIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
            relations: IndexMap::new(),
            key_to_entities: IndexMap::new(),
            key_to_relations: IndexMap::new(),
            built_at: chrono::Utc::now(),
        }
    }

    /// Index a batch of entity records
    ///
    /// Records missing an identifier or a name are skipped per record
    /// and never abort the batch. Returns the entity store after the
    /// pass so callers can inspect what was indexed.
    pub fn create_entity_key_values(
        &mut self,
        records: &[EntityRecord],
    ) -> &IndexMap<NodeId, EntityKeyValue> {
        tracing::info!(records = records.len(), "creating entity key-values");
        let mut skipped = 0usize;

        for record in records {
            if record.id().is_empty() || record.name().is_empty() {
                skipped += 1;
                continue;
            }

            let node_id = NodeId::new(record.id().to_string());
            let mut metadata = record.properties();
            metadata.insert("node_id".to_string(), record.id().to_string());

            let entry = EntityKeyValue {
                entity_name: record.name().to_string(),
                index_keys: vec![record.name().to_string()],
                value_content: record.value_content(),
                entity_type: record.entity_type().to_string(),
                metadata,
            };

            for key in &entry.index_keys {
                self.key_to_entities
                    .entry(key.clone())
                    .or_default()
                    .push(node_id.clone());
            }
            self.entities.insert(node_id, entry);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped entity records missing id or name");
        }
        tracing::info!(total = self.entities.len(), "entity key-values created");
        &self.entities
    }

    /// Index a batch of relationship triples
    ///
    /// Each kept triple gets a generated relation id and is discoverable
    /// under its relationship type plus the broader topic label when the
    /// type has one. Triples whose endpoints are not in the entity store
    /// are excluded as orphans.
    pub fn create_relation_key_values(
        &mut self,
        triples: &[RelationTriple],
    ) -> &IndexMap<RelationId, RelationKeyValue> {
        tracing::info!(triples = triples.len(), "creating relation key-values");
        let mut orphaned = 0usize;

        for triple in triples {
            let (source, target) = match (
                self.entities.get(&triple.source),
                self.entities.get(&triple.target),
            ) {
                (Some(s), Some(t)) => (s, t),
                _ => {
                    orphaned += 1;
                    tracing::debug!(
                        source = %triple.source,
                        target = %triple.target,
                        relation_type = %triple.relation_type,
                        "excluding orphaned relation triple"
                    );
                    continue;
                }
            };

            let mut index_keys = vec![triple.relation_type.clone()];
            if let Some(topic) = topic_label(&triple.relation_type) {
                index_keys.push(topic.to_string());
            }

            let value_content = format!(
                "{} {} {}",
                source.entity_name, triple.relation_type, target.entity_name
            );

            let relation_id = RelationId::new(format!("rel_{}", uuid::Uuid::new_v4()));
            let mut metadata = HashMap::new();
            metadata.insert("source_name".to_string(), source.entity_name.clone());
            metadata.insert("target_name".to_string(), target.entity_name.clone());

            let entry = RelationKeyValue {
                relation_id: relation_id.clone(),
                index_keys,
                value_content,
                relation_type: triple.relation_type.clone(),
                source_entity: triple.source.clone(),
                target_entity: triple.target.clone(),
                metadata,
            };

            for key in &entry.index_keys {
                self.key_to_relations
                    .entry(key.clone())
                    .or_default()
                    .push(relation_id.clone());
            }
            self.relations.insert(relation_id, entry);
        }

        if orphaned > 0 {
            tracing::warn!(orphaned, "excluded orphaned relation triples");
        }
        tracing::info!(total = self.relations.len(), "relation key-values created");
        &self.relations
    }

    /// Drop duplicate relation entries and duplicate key mappings
    ///
    /// A relation duplicates an earlier one when it shares the same
    /// `(source, target, relation_type)` triple; the first kept entry
    /// wins. Idempotent: a second run leaves the store unchanged.
    pub fn deduplicate_entities_and_relations(&mut self) {
        let mut seen: HashSet<(NodeId, NodeId, String)> = HashSet::new();
        let mut dropped: Vec<RelationId> = Vec::new();

        for (id, relation) in &self.relations {
            let signature = (
                relation.source_entity.clone(),
                relation.target_entity.clone(),
                relation.relation_type.clone(),
            );
            if !seen.insert(signature) {
                dropped.push(id.clone());
            }
        }

        for id in &dropped {
            self.relations.shift_remove(id);
        }
        if !dropped.is_empty() {
            let dropped_set: HashSet<&RelationId> = dropped.iter().collect();
            for ids in self.key_to_relations.values_mut() {
                ids.retain(|id| !dropped_set.contains(id));
            }
        }

        // entity store is keyed by node id, so only the key mappings can
        // accumulate duplicates across repeated build passes
        for ids in self.key_to_entities.values_mut() {
            let mut kept = HashSet::new();
            ids.retain(|id| kept.insert(id.clone()));
        }
        for ids in self.key_to_relations.values_mut() {
            let mut kept = HashSet::new();
            ids.retain(|id| kept.insert(id.clone()));
        }
        self.key_to_entities.retain(|_, ids| !ids.is_empty());
        self.key_to_relations.retain(|_, ids| !ids.is_empty());

        tracing::info!(
            dropped_relations = dropped.len(),
            entities = self.entities.len(),
            relations = self.relations.len(),
            "deduplication pass complete"
        );
    }

    /// Entity entries registered under the key
    ///
    /// Lookup is exact and case-sensitive. Unknown keys return an empty
    /// vector, never an error.
    pub fn get_entities_by_key(&self, key: &str) -> Vec<&EntityKeyValue> {
        self.key_to_entities
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Relation entries registered under the key
    ///
    /// Same lookup policy as [`Self::get_entities_by_key`]: exact,
    /// case-sensitive, empty vector for unknown keys.
    pub fn get_relations_by_key(&self, key: &str) -> Vec<&RelationKeyValue> {
        self.key_to_relations
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.relations.get(id)).collect())
            .unwrap_or_default()
    }

    /// Entity entry for a node id, when indexed
    pub fn entity_by_id(&self, id: &NodeId) -> Option<&EntityKeyValue> {
        self.entities.get(id)
    }

    /// Number of indexed entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of indexed relations
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Whether nothing has been indexed yet
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Counts by type over the post-filter contents
    pub fn get_statistics(&self) -> IndexStatistics {
        let mut entities_by_type: IndexMap<String, usize> = IndexMap::new();
        for entry in self.entities.values() {
            *entities_by_type.entry(entry.entity_type.clone()).or_default() += 1;
        }

        let mut relations_by_type: IndexMap<String, usize> = IndexMap::new();
        for entry in self.relations.values() {
            *relations_by_type
                .entry(entry.relation_type.clone())
                .or_default() += 1;
        }

        IndexStatistics {
            entity_count: self.entities.len(),
            relation_count: self.relations.len(),
            entities_by_type,
            relations_by_type,
            key_count_entities: self.key_to_entities.len(),
            key_count_relations: self.key_to_relations.len(),
            built_at: self.built_at,
        }
    }
}
