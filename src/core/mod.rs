//! Core data structures and abstractions for TourRAG
//!
//! This module contains the fundamental types, traits, and error handling
//! that power the retrieval pipeline.

pub mod error;
pub mod mock_providers;
pub mod traits;

// Re-export key items for convenience
pub use error::{ErrorContext, ErrorSeverity, Result, TourRagError};
pub use traits::{
    GraphStore, LanguageModel, ModelInfo, Neighborhood, PathRecord, RelationTriple, VectorHit,
    VectorStore,
};

use std::collections::HashMap;

/// Unique identifier for graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Creates a new NodeId from a string
    pub fn new(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Unique identifier for indexed relations
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RelationId(pub String);

impl RelationId {
    /// Creates a new RelationId from a string
    pub fn new(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<RelationId> for String {
    fn from(id: RelationId) -> Self {
        id.0
    }
}

/// A read-only snapshot of a graph entity
///
/// Produced by graph store queries and discarded after the retrieval cycle
/// that created it. Never cached across requests.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphNode {
    /// Globally unique node identifier
    pub node_id: NodeId,
    /// Type tags attached to the node (e.g. City, Attraction, Hotel)
    pub labels: Vec<String>,
    /// Display name of the entity
    pub name: String,
    /// Raw property map, schema varies per label
    pub properties: HashMap<String, String>,
}

impl GraphNode {
    /// Create a new node snapshot
    pub fn new(node_id: impl Into<NodeId>, labels: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            labels,
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Attach a property to the snapshot
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check whether the node carries a given label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Look up a property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The node's primary label, or "Unknown" when untagged
    pub fn primary_label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("Unknown")
    }
}

/// Which retrieval strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalLevel {
    /// Entity-level keyword lookup
    Entity,
    /// Topic-level keyword lookup
    Topic,
    /// Dense vector similarity search
    Vector,
    /// Graph-structure traversal
    Graph,
}

impl std::fmt::Display for RetrievalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            RetrievalLevel::Entity => "entity",
            RetrievalLevel::Topic => "topic",
            RetrievalLevel::Vector => "vector",
            RetrievalLevel::Graph => "graph",
        };
        write!(f, "{tag}")
    }
}

/// A scored candidate produced by any retrieval engine
///
/// Relevance scores are engine-local and not normalized across engines;
/// callers must not compare scores from different engines directly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievalResult {
    /// Rendered text for LLM consumption
    pub content: String,
    /// Identifier of the node this result describes
    pub node_id: NodeId,
    /// Entity type tag of the node
    pub node_type: String,
    /// Engine-local ranking score, higher is better
    pub relevance_score: f64,
    /// Strategy that produced this result
    pub retrieval_level: RetrievalLevel,
    /// Free-form metadata, always includes a human-readable name
    pub metadata: HashMap<String, String>,
}

impl RetrievalResult {
    /// Create a new retrieval result
    pub fn new(
        content: impl Into<String>,
        node_id: impl Into<NodeId>,
        node_type: impl Into<String>,
        relevance_score: f64,
        retrieval_level: RetrievalLevel,
    ) -> Self {
        Self {
            content: content.into(),
            node_id: node_id.into(),
            node_type: node_type.into(),
            relevance_score,
            retrieval_level,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The traversal shape a graph query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// Direct relationships of the source entities
    EntityRelation,
    /// Bounded multi-hop expansion from the source entities
    MultiHop,
    /// Local subgraph extraction around the source entities
    Subgraph,
    /// Shortest paths between a source and a target entity
    PathFinding,
    /// Cluster-oriented exploration, executed as a subgraph extraction
    Clustering,
}

impl QueryType {
    /// Parse a type tag as produced by the intent model, tolerating any casing
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "ENTITY_RELATION" => Some(Self::EntityRelation),
            "MULTI_HOP" => Some(Self::MultiHop),
            "SUBGRAPH" => Some(Self::Subgraph),
            "PATH_FINDING" => Some(Self::PathFinding),
            "CLUSTERING" => Some(Self::Clustering),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            QueryType::EntityRelation => "ENTITY_RELATION",
            QueryType::MultiHop => "MULTI_HOP",
            QueryType::Subgraph => "SUBGRAPH",
            QueryType::PathFinding => "PATH_FINDING",
            QueryType::Clustering => "CLUSTERING",
        };
        write!(f, "{tag}")
    }
}

/// A typed traversal plan derived from a natural-language query
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphQuery {
    /// Traversal strategy to execute
    pub query_type: QueryType,
    /// Entity names the traversal starts from
    pub source_entities: Vec<String>,
    /// Entity names the traversal aims at (path finding only)
    pub target_entities: Vec<String>,
    /// Relationship types emphasised by the query, if any
    pub relation_types: Vec<String>,
    /// Hop bound for the traversal
    pub max_depth: usize,
    /// Node cap for subgraph extraction
    pub max_nodes: usize,
}

impl GraphQuery {
    /// Create a plan with the default depth and node bounds
    pub fn new(query_type: QueryType, source_entities: Vec<String>) -> Self {
        Self {
            query_type,
            source_entities,
            target_entities: Vec::new(),
            relation_types: Vec::new(),
            max_depth: 2,
            max_nodes: 50,
        }
    }

    /// Set the target entities
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.target_entities = targets;
        self
    }

    /// Set the emphasised relationship types
    pub fn with_relation_types(mut self, relation_types: Vec<String>) -> Self {
        self.relation_types = relation_types;
        self
    }

    /// Set the hop bound
    pub fn with_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the node cap
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}

/// A scored traversal path, produced fresh per query and never persisted
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphPath {
    /// Nodes along the path, source first
    pub nodes: Vec<GraphNode>,
    /// Relationship type per traversed edge
    pub relation_types: Vec<String>,
    /// Number of hops (edges) on the path
    pub path_length: usize,
    /// Traversal-strategy-local relevance score, higher is better
    pub relevance_score: f64,
    /// Strategy tag recorded into result metadata (e.g. "multi_hop")
    pub path_type: String,
}

/// Structural measurements over an extracted subgraph
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphMetrics {
    /// Number of distinct nodes in the subgraph
    pub node_count: usize,
    /// Number of relationships in the subgraph
    pub relationship_count: usize,
    /// Edge density over the undirected complete graph, zero for n <= 1
    pub density: f64,
}

impl GraphMetrics {
    /// Measure a subgraph given its node and edge counts
    pub fn measure(node_count: usize, relationship_count: usize) -> Self {
        let density = if node_count > 1 {
            let possible = (node_count * (node_count - 1)) as f64 / 2.0;
            relationship_count as f64 / possible
        } else {
            0.0
        };
        Self {
            node_count,
            relationship_count,
            density,
        }
    }
}

/// A local knowledge subgraph extracted around query entities
///
/// The empty subgraph (all collections empty, zero metrics) is the
/// defined fallback when traversal fails, not an error state.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeSubgraph {
    /// Nodes matching the query's source entities
    pub central_nodes: Vec<GraphNode>,
    /// Nodes reached by expanding around the central nodes
    pub connected_nodes: Vec<GraphNode>,
    /// Relationships among all subgraph nodes
    pub relationships: Vec<RelationTriple>,
    /// Structural measurements of this subgraph
    pub metrics: GraphMetrics,
    /// Natural-language reasoning chains derived from the structure
    pub reasoning_chains: Vec<String>,
}

impl KnowledgeSubgraph {
    /// Whether the extraction reached anything at all
    pub fn is_empty(&self) -> bool {
        self.central_nodes.is_empty() && self.connected_nodes.is_empty()
    }

    /// All nodes in the subgraph, central first
    pub fn all_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.central_nodes.iter().chain(self.connected_nodes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_conversions() {
        let id = NodeId::from("city_hangzhou");
        assert_eq!(id.to_string(), "city_hangzhou");
        assert_eq!(String::from(id), "city_hangzhou");
    }

    #[test]
    fn test_graph_node_labels_and_properties() {
        let node = GraphNode::new("attr_1", vec!["Attraction".to_string()], "西湖")
            .with_property("city", "杭州");

        assert!(node.has_label("Attraction"));
        assert!(!node.has_label("City"));
        assert_eq!(node.primary_label(), "Attraction");
        assert_eq!(node.property("city"), Some("杭州"));
        assert_eq!(node.property("missing"), None);
    }

    #[test]
    fn test_retrieval_level_display() {
        assert_eq!(RetrievalLevel::Entity.to_string(), "entity");
        assert_eq!(RetrievalLevel::Topic.to_string(), "topic");
        assert_eq!(RetrievalLevel::Vector.to_string(), "vector");
        assert_eq!(RetrievalLevel::Graph.to_string(), "graph");
    }

    #[test]
    fn test_query_type_parsing_is_case_insensitive() {
        assert_eq!(QueryType::parse("multi_hop"), Some(QueryType::MultiHop));
        assert_eq!(QueryType::parse("SUBGRAPH"), Some(QueryType::Subgraph));
        assert_eq!(QueryType::parse(" Path_Finding "), Some(QueryType::PathFinding));
        assert_eq!(QueryType::parse("unknown"), None);
    }

    #[test]
    fn test_graph_query_defaults() {
        let query = GraphQuery::new(QueryType::MultiHop, vec!["杭州".to_string()]);
        assert_eq!(query.max_depth, 2);
        assert_eq!(query.max_nodes, 50);
        assert!(query.target_entities.is_empty());
    }

    #[test]
    fn test_graph_metrics_density() {
        // 4 nodes, 3 edges: density = 3 / (4*3/2) = 0.5
        let metrics = GraphMetrics::measure(4, 3);
        assert!((metrics.density - 0.5).abs() < 1e-9);

        // sparse degenerate cases yield zero
        assert_eq!(GraphMetrics::measure(1, 0).density, 0.0);
        assert_eq!(GraphMetrics::measure(0, 0).density, 0.0);
    }

    #[test]
    fn test_retrieval_result_metadata() {
        let result = RetrievalResult::new(
            "城市名称：杭州",
            "city_hangzhou",
            "City",
            0.9,
            RetrievalLevel::Entity,
        )
        .with_metadata("entity_name", "杭州");

        assert_eq!(result.metadata.get("entity_name").map(String::as_str), Some("杭州"));
        assert_eq!(result.retrieval_level, RetrievalLevel::Entity);
    }
}
