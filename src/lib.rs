//! # TourRAG Core
//!
//! Hybrid retrieval core for a travel-domain question-answering
//! assistant. The crate turns a property graph of cities, attractions,
//! hotels, food and festivals into ranked, LLM-ready context documents:
//!
//! - Entity/relation key-value indexing with atomic rebuild swaps
//! - Graph-structure retrieval: intent-classified traversals, subgraph
//!   extraction, and reasoning-chain synthesis
//! - Dual-level (entity + topic) keyword retrieval with graph-store
//!   supplements
//! - Round-robin hybrid merging of graph and vector results
//! - Lexical query routing between the pipelines
//!
//! External collaborators — the property graph, the vector index, and
//! the language model — are consumed through the traits in [`core`];
//! in-memory reference adapters ship in [`storage`] and
//! [`core::mock_providers`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tourrag::config::Config;
//! use tourrag::core::mock_providers::MockLanguageModel;
//! use tourrag::graph::GraphRagEngine;
//! use tourrag::index::{IndexBuilder, SharedIndex};
//! use tourrag::query::QueryRouter;
//! use tourrag::retrieval::HybridEngine;
//! use tourrag::storage::{MemoryGraphStore, MemoryVectorStore};
//!
//! # async fn example() -> tourrag::core::Result<()> {
//! let config = Config::default();
//! let store = Arc::new(MemoryGraphStore::new());
//! let vectors = Arc::new(MemoryVectorStore::default());
//! let model = Arc::new(MockLanguageModel::new("{}"));
//!
//! let index = SharedIndex::new(IndexBuilder::new(store.clone()).build().await?);
//! let graph = GraphRagEngine::new(store.clone(), model.clone(), &config);
//! let hybrid = HybridEngine::new(index, store, vectors, model, &config);
//! let router = QueryRouter::new(graph, hybrid);
//!
//! let (results, analysis) = router
//!     .route_query("杭州有什么好玩的", config.retrieval.top_k)
//!     .await;
//! # let _ = (results, analysis);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration loading and validation
pub mod config;
/// Core data model, collaborator traits, and error handling
pub mod core;
/// Graph-structure retrieval engine
pub mod graph;
/// Entity/relation key-value index
pub mod index;
/// Query routing between the retrieval pipelines
pub mod query;
/// Dual-level and hybrid retrieval engines
pub mod retrieval;
/// In-memory reference store adapters
pub mod storage;

/// Prelude module containing the most commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::core::{
        GraphNode, GraphStore, LanguageModel, NodeId, Result, RetrievalLevel, RetrievalResult,
        TourRagError, VectorStore,
    };
    pub use crate::graph::GraphRagEngine;
    pub use crate::index::{IndexBuilder, KeyValueIndex, SharedIndex};
    pub use crate::query::{QueryAnalysis, QueryRouter, RetrievalStrategy};
    pub use crate::retrieval::{DualLevelEngine, HybridEngine};
}

// Re-export the core data model at the crate root
pub use crate::config::Config;
pub use crate::core::{
    ErrorContext, ErrorSeverity, GraphNode, GraphPath, GraphQuery, GraphStore, KnowledgeSubgraph,
    LanguageModel, NodeId, QueryType, RelationId, Result, RetrievalLevel, RetrievalResult,
    TourRagError, VectorStore,
};
