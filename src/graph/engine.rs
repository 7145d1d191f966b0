//! Graph-structure retrieval engine
//!
//! Orchestrates one graph retrieval round: classify the query's
//! traversal intent, execute the matching strategy (path traversal or
//! subgraph extraction with structure reasoning), convert the findings
//! into scored retrieval results, and rank them. Store outages and
//! model misbehavior degrade to an empty result list; this engine never
//! surfaces errors to its caller.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::core::{
    GraphPath, GraphQuery, GraphStore, KnowledgeSubgraph, LanguageModel, NodeId, QueryType,
    RetrievalLevel, RetrievalResult, TourRagError,
};

use super::intent::IntentClassifier;
use super::planning;
use super::subgraph::{graph_structure_reasoning, SubgraphExtractor};
use super::traversal::GraphTraverser;

/// Query-plan-driven retrieval over the travel knowledge graph
pub struct GraphRagEngine {
    store: Arc<dyn GraphStore>,
    intent: IntentClassifier,
    traverser: GraphTraverser,
    extractor: SubgraphExtractor,
}

impl GraphRagEngine {
    /// Build an engine over a store and an intent-classification model
    pub fn new(
        store: Arc<dyn GraphStore>,
        model: Arc<dyn LanguageModel<Error = TourRagError>>,
        config: &Config,
    ) -> Self {
        Self {
            intent: IntentClassifier::new(model, config.request_timeout()),
            traverser: GraphTraverser::new(Arc::clone(&store)),
            extractor: SubgraphExtractor::new(Arc::clone(&store)),
            store,
        }
    }

    /// Run one full graph retrieval round for a query
    ///
    /// Classifies intent, executes the strategy the classified plan
    /// asks for, ranks the converted results by relevance descending
    /// and truncates to `top_k`. Returns an empty list when the store
    /// is unreachable.
    pub async fn graph_rag_search(&self, query: &str, top_k: usize) -> Vec<RetrievalResult> {
        info!(query = %query, "starting graph retrieval");

        match self.store.health_check().await {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                warn!("graph store unavailable, returning no graph results");
                return Vec::new();
            }
        }

        let plan = self.intent.understand_graph_query(query).await;
        info!(query_type = %plan.query_type, "query intent classified");

        let mut results = match plan.query_type {
            QueryType::MultiHop | QueryType::PathFinding | QueryType::EntityRelation => {
                let paths = self.traverser.multi_hop_traversal(&plan).await;
                paths_to_results(&paths)
            }
            QueryType::Subgraph | QueryType::Clustering => {
                let mut subgraph = self.extractor.extract_knowledge_subgraph(&plan).await;
                subgraph.reasoning_chains = graph_structure_reasoning(&subgraph, query);
                subgraph_to_results(&subgraph)
            }
        };

        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(top_k);

        info!(results = results.len(), "graph retrieval finished");
        results
    }

    /// Plan one or two traversal queries by query complexity
    ///
    /// High-complexity questions yield a subgraph plan plus a multi-hop
    /// plan; the caller executes both and merges.
    pub fn adaptive_query_planning(&self, query: &str) -> Vec<GraphQuery> {
        planning::plan_queries(query)
    }
}

/// Render discovered paths as scored retrieval results
fn paths_to_results(paths: &[GraphPath]) -> Vec<RetrievalResult> {
    paths
        .iter()
        .map(|path| {
            let (node_id, node_type, entity_name) = match path.nodes.first() {
                Some(node) => (
                    node.node_id.clone(),
                    node.primary_label().to_string(),
                    node.name.clone(),
                ),
                None => (
                    NodeId::from("graph_path"),
                    "Unknown".to_string(),
                    "图结构结果".to_string(),
                ),
            };

            RetrievalResult::new(
                describe_path(path),
                node_id,
                node_type,
                path.relevance_score,
                RetrievalLevel::Graph,
            )
            .with_metadata("search_type", "graph_path")
            .with_metadata("path_type", path.path_type.clone())
            .with_metadata("path_length", path.path_length.to_string())
            .with_metadata("node_count", path.nodes.len().to_string())
            .with_metadata("relationship_count", path.relation_types.len().to_string())
            .with_metadata("entity_name", entity_name)
        })
        .collect()
}

/// Render a path as "甲 --RELATION--> 乙" chain text
fn describe_path(path: &GraphPath) -> String {
    if path.nodes.is_empty() {
        return "空路径".to_string();
    }

    let mut description = String::new();
    for (i, node) in path.nodes.iter().enumerate() {
        description.push_str(&node.name);
        if let Some(relation) = path.relation_types.get(i) {
            description.push_str(" --");
            description.push_str(relation);
            description.push_str("--> ");
        }
    }
    description
}

/// Render an extracted subgraph as a single summary result
///
/// The summary is descriptive rather than ranked, so it carries a zero
/// relevance score; the reasoning chains ride along in metadata. An
/// empty subgraph produces nothing.
fn subgraph_to_results(subgraph: &KnowledgeSubgraph) -> Vec<RetrievalResult> {
    if subgraph.is_empty() {
        return Vec::new();
    }

    let central_names: Vec<&str> = subgraph
        .central_nodes
        .iter()
        .map(|node| node.name.as_str())
        .collect();
    let content = format!(
        "关于 {} 的知识网络，包含 {} 个相关概念和 {} 个关系。",
        central_names.join(", "),
        subgraph.connected_nodes.len(),
        subgraph.relationships.len(),
    );

    let (node_id, node_type, entity_name) = match subgraph.central_nodes.first() {
        Some(node) => (
            node.node_id.clone(),
            node.primary_label().to_string(),
            node.name.clone(),
        ),
        None => (
            NodeId::from("knowledge_subgraph"),
            "Unknown".to_string(),
            "知识子图".to_string(),
        ),
    };

    let mut result = RetrievalResult::new(content, node_id, node_type, 0.0, RetrievalLevel::Graph)
        .with_metadata("search_type", "knowledge_subgraph")
        .with_metadata("node_count", subgraph.connected_nodes.len().to_string())
        .with_metadata(
            "relationship_count",
            subgraph.relationships.len().to_string(),
        )
        .with_metadata("graph_density", subgraph.metrics.density.to_string())
        .with_metadata("entity_name", entity_name);
    if !subgraph.reasoning_chains.is_empty() {
        result = result.with_metadata("reasoning_chains", subgraph.reasoning_chains.join("\n"));
    }

    vec![result]
}
