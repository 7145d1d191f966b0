//! Graph-structure retrieval over the travel knowledge graph
//!
//! The engine in this module answers queries by walking the graph
//! rather than matching text: an intent classifier decides which
//! traversal shape a query needs, the traverser and subgraph extractor
//! execute it, and structure reasoning annotates subgraph findings
//! with natural-language chains.
//!
//! - [`intent`] — LLM-backed classification of a query into a typed
//!   traversal plan, with a subgraph fallback for model misbehavior
//! - [`traversal`] — multi-hop, entity-relation and shortest-path
//!   strategies with composite path scoring
//! - [`subgraph`] — neighborhood extraction plus travel-domain
//!   reasoning-chain synthesis and validation
//! - [`planning`] — complexity-adaptive generation of traversal plans
//! - [`engine`] — the orchestrating [`GraphRagEngine`]

pub mod engine;
pub mod intent;
pub mod planning;
pub mod subgraph;
pub mod traversal;

pub use engine::GraphRagEngine;
pub use intent::IntentClassifier;
pub use planning::{plan_queries, query_complexity};
pub use subgraph::{graph_structure_reasoning, SubgraphExtractor};
pub use traversal::GraphTraverser;
