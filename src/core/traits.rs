//! Core traits for the external collaborators of the retrieval pipeline
//!
//! The retrieval core consumes three capabilities it does not implement
//! itself: a property graph store, a vector store, and a text-completion
//! model. Each is abstracted behind an async trait so engines can be
//! composed from `Arc<dyn ...>` handles and exercised with in-memory
//! implementations in tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::{GraphNode, NodeId, Result};

/// A relationship triple as read from the graph store
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelationTriple {
    /// Source node identifier
    pub source: NodeId,
    /// Relationship type tag (e.g. "HAS_ATTRACTION")
    pub relation_type: String,
    /// Target node identifier
    pub target: NodeId,
}

impl RelationTriple {
    /// Create a new triple
    pub fn new(
        source: impl Into<NodeId>,
        relation_type: impl Into<String>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            source: source.into(),
            relation_type: relation_type.into(),
            target: target.into(),
        }
    }
}

/// An ordered node and relationship sequence returned by a path query
///
/// `relation_types` holds one entry per hop, so its length is always one
/// less than `nodes` for a non-empty path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PathRecord {
    /// Nodes along the path, source first
    pub nodes: Vec<GraphNode>,
    /// Relationship type per traversed edge
    pub relation_types: Vec<String>,
}

impl PathRecord {
    /// Number of edges in the path
    pub fn hop_count(&self) -> usize {
        self.relation_types.len()
    }
}

/// The nodes and relationships within a bounded neighborhood expansion
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Neighborhood {
    /// All nodes reached, including the sources
    pub nodes: Vec<GraphNode>,
    /// Relationships among the reached nodes
    pub relationships: Vec<RelationTriple>,
}

impl Neighborhood {
    /// Whether the expansion reached anything at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Read interface of the property graph store
///
/// Implementations wrap whatever backend holds the travel graph. All
/// queries are reads; the core never mutates the store. Failures are
/// surfaced as errors and handled by the engines' degradation policy,
/// so implementations should not retry internally.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// All nodes carrying the given label
    async fn nodes_by_label(&self, label: &str) -> Result<Vec<GraphNode>>;

    /// Pattern-match nodes whose name or description contains the fragment
    ///
    /// `label` restricts the match to one node type when present. Matching
    /// is case-sensitive substring containment.
    async fn find_nodes(
        &self,
        label: Option<&str>,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<GraphNode>>;

    /// All relationship triples in the store
    async fn relationship_triples(&self) -> Result<Vec<RelationTriple>>;

    /// Bounded-depth paths starting from the node with the given name
    async fn paths_from(
        &self,
        source_name: &str,
        max_depth: usize,
        limit: usize,
    ) -> Result<Vec<PathRecord>>;

    /// Shortest paths between two named nodes, bounded by hop count
    async fn paths_between(
        &self,
        source_name: &str,
        target_name: &str,
        max_depth: usize,
        limit: usize,
    ) -> Result<Vec<PathRecord>>;

    /// Nodes within `max_depth` hops of the named sources, capped at
    /// `max_nodes`, together with the relationships among them
    async fn expand_neighborhood(
        &self,
        source_names: &[String],
        max_depth: usize,
        max_nodes: usize,
    ) -> Result<Neighborhood>;

    /// Names of the immediate neighbors of a node
    async fn neighbor_names(&self, node_id: &NodeId, limit: usize) -> Result<Vec<String>>;

    /// Degree (number of incident edges) of a node
    async fn node_degree(&self, node_id: &NodeId) -> Result<usize>;

    /// Health check for the store connection
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// A scored hit returned by the vector store
///
/// `score` follows the distance convention: lower means more similar.
/// Hits describing a graph entity carry its id under the `node_id`
/// metadata key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorHit {
    /// Store-local record identifier
    pub id: String,
    /// Text fragment content
    pub content: String,
    /// Distance-style score, lower is more similar
    pub score: f64,
    /// Metadata attached at ingestion time
    pub metadata: HashMap<String, String>,
}

impl VectorHit {
    /// The graph node this fragment describes, when known
    pub fn node_id(&self) -> Option<NodeId> {
        self.metadata.get("node_id").map(|id| NodeId::new(id.clone()))
    }
}

/// Read interface of the dense vector index
///
/// Implementations embed the query text themselves; the embedding model
/// is part of the adapter, not of this core.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest-neighbor search for the query text
    async fn search(&self, query: &str, k: usize) -> Result<Vec<VectorHit>>;

    /// Number of indexed fragments
    async fn len(&self) -> usize;

    /// Whether the index holds no fragments
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Health check for the store connection
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Information about a language model
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub name: String,
    /// Provider or backend name
    pub provider: String,
}

/// Text-completion capability of the external language model
///
/// The core treats completions as unreliable input: every structured
/// response is parsed defensively and has a documented fallback. Callers
/// wrap invocations in their configured timeout.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// The error type returned by completion operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a text completion for the prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the model is available
    async fn is_available(&self) -> bool;

    /// Get model information
    async fn model_info(&self) -> ModelInfo;

    /// Health check for the completion endpoint
    async fn health_check(&self) -> Result<bool> {
        self.is_available().await.then_some(true).ok_or_else(|| {
            crate::core::TourRagError::LanguageModel {
                message: "Language model health check failed".to_string(),
            }
        })
    }
}
