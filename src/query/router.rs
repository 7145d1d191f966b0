//! Strategy selection between graph-structure and hybrid retrieval
//!
//! The router reads two lexical signals off the raw query text: the
//! complexity grade shared with adaptive planning, and a relationship
//! intensity derived from relational vocabulary. Relationship-heavy
//! queries go to the graph engine, complex non-relational queries run
//! both engines with the graph results leading, and everything else
//! takes the hybrid path.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{NodeId, RetrievalResult};
use crate::graph::{query_complexity, GraphRagEngine};
use crate::retrieval::HybridEngine;

/// Terms signalling that a query asks about connections between entities
const RELATION_TERMS: [&str; 7] = ["关系", "相关", "附近", "周边", "之间", "连接", "路线"];

/// Intensity contributed by each matched relation term
const INTENSITY_PER_TERM: f64 = 0.2;

/// Relationship intensity at or above which the graph engine runs alone
const GRAPH_RAG_THRESHOLD: f64 = 0.4;

/// Complexity grade at or above which both engines run
const COMBINED_THRESHOLD: f64 = 0.6;

/// The retrieval pipeline selected for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Dual-level retrieval merged with vector search
    HybridTraditional,
    /// Graph-structure retrieval
    GraphRag,
    /// Both pipelines, graph results leading
    Combined,
}

/// Signals read off a query and the routing decision they produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Indicator-term complexity grade in [0, 1]
    pub query_complexity: f64,
    /// Relation-term intensity in [0, 1]
    pub relationship_intensity: f64,
    /// The pipeline chosen for this query
    pub recommended_strategy: RetrievalStrategy,
    /// Natural-language rationale for the choice
    pub reasoning: String,
}

/// Relation-term intensity in [0, 1]
///
/// Each distinct matched term contributes [`INTENSITY_PER_TERM`]; two
/// relational terms are enough to clear the graph-engine threshold.
pub fn relationship_intensity(query: &str) -> f64 {
    let hits = RELATION_TERMS
        .iter()
        .filter(|term| query.contains(*term))
        .count();
    (hits as f64 * INTENSITY_PER_TERM).min(1.0)
}

/// Score a query's routing signals and pick a strategy
pub fn analyze_query(query: &str) -> QueryAnalysis {
    let complexity = query_complexity(query);
    let intensity = relationship_intensity(query);

    let (strategy, reasoning) = if intensity >= GRAPH_RAG_THRESHOLD {
        (
            RetrievalStrategy::GraphRag,
            format!("查询包含较多关系词汇（密集度 {intensity:.2}），采用图结构检索"),
        )
    } else if complexity >= COMBINED_THRESHOLD {
        (
            RetrievalStrategy::Combined,
            format!("查询复杂度较高（{complexity:.2}），融合图结构与混合检索结果"),
        )
    } else {
        (
            RetrievalStrategy::HybridTraditional,
            "常规查询，采用双级与向量混合检索".to_string(),
        )
    };

    QueryAnalysis {
        query_complexity: complexity,
        relationship_intensity: intensity,
        recommended_strategy: strategy,
        reasoning,
    }
}

/// Dispatches each query to the pipeline its signals call for
pub struct QueryRouter {
    graph: GraphRagEngine,
    hybrid: HybridEngine,
}

impl QueryRouter {
    /// Build a router over the two retrieval pipelines
    pub fn new(graph: GraphRagEngine, hybrid: HybridEngine) -> Self {
        Self { graph, hybrid }
    }

    /// Analyze the query, execute the recommended strategy, and return
    /// both the results and the analysis that chose the strategy
    ///
    /// Pipeline failures inside either engine degrade to empty result
    /// lists; the router itself never fails.
    pub async fn route_query(
        &self,
        query: &str,
        top_k: usize,
    ) -> (Vec<RetrievalResult>, QueryAnalysis) {
        let analysis = analyze_query(query);
        info!(
            strategy = ?analysis.recommended_strategy,
            complexity = analysis.query_complexity,
            intensity = analysis.relationship_intensity,
            "routing query"
        );

        let results = match analysis.recommended_strategy {
            RetrievalStrategy::GraphRag => self.graph.graph_rag_search(query, top_k).await,
            RetrievalStrategy::HybridTraditional => self.hybrid.hybrid_search(query, top_k).await,
            RetrievalStrategy::Combined => self.combined_search(query, top_k).await,
        };

        (results, analysis)
    }

    /// Run both pipelines and concatenate graph results before hybrid
    ///
    /// The concatenation keeps each pipeline's internal order rather
    /// than re-sorting across the incomparable score scales; duplicate
    /// node ids keep their first (graph-side) occurrence.
    async fn combined_search(&self, query: &str, top_k: usize) -> Vec<RetrievalResult> {
        let (graph_results, hybrid_results) = tokio::join!(
            self.graph.graph_rag_search(query, top_k),
            self.hybrid.hybrid_search(query, top_k),
        );

        let mut merged = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        for result in graph_results.into_iter().chain(hybrid_results) {
            if seen.insert(result.node_id.clone()) {
                merged.push(result);
            }
        }
        merged.truncate(top_k);
        merged
    }
}
