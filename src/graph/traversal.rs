//! Traversal strategies over the travel graph
//!
//! Implements the three path-producing strategies behind
//! `graph_rag_search`: bounded multi-hop expansion, single-hop entity
//! relations weighted by domain priors, and shortest paths between
//! named endpoints. Every strategy degrades to an empty path list when
//! the store misbehaves; errors never cross this module's boundary.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{GraphNode, GraphPath, GraphQuery, GraphStore, PathRecord, QueryType};

/// Result cap for multi-hop traversal
const MULTI_HOP_LIMIT: usize = 20;
/// Result cap for entity-relation lookups
const ENTITY_RELATION_LIMIT: usize = 15;
/// Result cap for shortest-path queries
const SHORTEST_PATH_LIMIT: usize = 10;
/// Hop bound for shortest-path queries, independent of the plan's depth
const SHORTEST_PATH_DEPTH: usize = 4;
/// How many store nodes a single source-entity string may match
const SOURCE_MATCH_LIMIT: usize = 10;
/// Raw candidate paths fetched per start node before scoring
const PATH_CANDIDATE_LIMIT: usize = 100;

/// Executes traversal plans against the graph store
pub struct GraphTraverser {
    store: Arc<dyn GraphStore>,
}

impl GraphTraverser {
    /// Create a traverser over the given store
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Execute the traversal strategy selected by the plan
    ///
    /// Subgraph-shaped plans produce no paths here; they are handled by
    /// the subgraph extractor.
    pub async fn multi_hop_traversal(&self, plan: &GraphQuery) -> Vec<GraphPath> {
        info!(
            sources = ?plan.source_entities,
            targets = ?plan.target_entities,
            query_type = %plan.query_type,
            "executing graph traversal"
        );

        let paths = match plan.query_type {
            QueryType::MultiHop => self.multi_hop_paths(plan).await,
            QueryType::EntityRelation => self.entity_relation_paths(plan).await,
            QueryType::PathFinding => self.shortest_paths(plan).await,
            QueryType::Subgraph | QueryType::Clustering => Vec::new(),
        };

        info!(paths = paths.len(), "graph traversal finished");
        paths
    }

    /// Bounded multi-hop expansion scored by a composite of path length,
    /// node connectivity and relation-type matches
    async fn multi_hop_paths(&self, plan: &GraphQuery) -> Vec<GraphPath> {
        let mut paths = Vec::new();

        for start in &self.matched_sources(&plan.source_entities).await {
            let records = match self
                .store
                .paths_from(&start.name, plan.max_depth, PATH_CANDIDATE_LIMIT)
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    warn!(start = %start.name, error = %e, "multi-hop expansion failed");
                    continue;
                }
            };

            for record in records {
                if record.nodes.len() < 2 {
                    continue;
                }
                if !plan.target_entities.is_empty() && !ends_on_target(&record, plan) {
                    continue;
                }
                let relevance = self.score_multi_hop(&record, &plan.relation_types).await;
                paths.push(to_graph_path(record, relevance, "multi_hop"));
            }
        }

        sort_and_truncate(paths, MULTI_HOP_LIMIT)
    }

    /// Single-hop relations weighted by fixed domain priors
    async fn entity_relation_paths(&self, plan: &GraphQuery) -> Vec<GraphPath> {
        let mut paths = Vec::new();

        for start in &self.matched_sources(&plan.source_entities).await {
            let records = match self
                .store
                .paths_from(&start.name, 1, PATH_CANDIDATE_LIMIT)
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    warn!(start = %start.name, error = %e, "entity relation lookup failed");
                    continue;
                }
            };

            for record in records {
                let Some(target) = record.nodes.get(1) else {
                    continue;
                };
                if target.name.is_empty() {
                    continue;
                }
                let weight = record
                    .relation_types
                    .first()
                    .map(|t| relation_weight(t))
                    .unwrap_or(0.5);
                paths.push(to_graph_path(record, weight, "entity_relation"));
            }
        }

        sort_and_truncate(paths, ENTITY_RELATION_LIMIT)
    }

    /// Shortest paths between source and target entities, scored by the
    /// domain relevance of the node types traversed
    async fn shortest_paths(&self, plan: &GraphQuery) -> Vec<GraphPath> {
        let mut paths = Vec::new();
        let sources = self.matched_sources(&plan.source_entities).await;
        let targets = self.matched_sources(&plan.target_entities).await;

        for source in &sources {
            for target in &targets {
                if source.node_id == target.node_id {
                    continue;
                }
                let records = match self
                    .store
                    .paths_between(
                        &source.name,
                        &target.name,
                        SHORTEST_PATH_DEPTH,
                        SHORTEST_PATH_LIMIT,
                    )
                    .await
                {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(
                            source = %source.name,
                            target = %target.name,
                            error = %e,
                            "shortest path query failed"
                        );
                        continue;
                    }
                };

                for record in records {
                    let hops = record.hop_count().max(1);
                    let relevance = average_node_score(&record.nodes) * 2.0 / hops as f64;
                    paths.push(to_graph_path(record, relevance, "shortest_path"));
                }
            }
        }

        sort_and_truncate(paths, SHORTEST_PATH_LIMIT)
    }

    /// Resolve source-entity strings to store nodes by substring match,
    /// deduplicated by node id across entities
    async fn matched_sources(&self, entities: &[String]) -> Vec<GraphNode> {
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for entity in entities {
            let nodes = match self.store.find_nodes(None, entity, SOURCE_MATCH_LIMIT).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(entity = %entity, error = %e, "source entity match failed");
                    continue;
                }
            };
            for node in nodes {
                if seen.insert(node.node_id.clone()) {
                    matches.push(node);
                }
            }
        }
        matches
    }

    /// Composite multi-hop score: inverse length, average connectivity,
    /// plus a bonus when any traversed relation matches the plan
    async fn score_multi_hop(&self, record: &PathRecord, relation_types: &[String]) -> f64 {
        let hops = record.hop_count().max(1) as f64;

        let mut degree_sum = 0usize;
        for node in &record.nodes {
            degree_sum += self.store.node_degree(&node.node_id).await.unwrap_or(0);
        }
        let connectivity = degree_sum as f64 / 10.0 / record.nodes.len() as f64;

        let relation_bonus = if record
            .relation_types
            .iter()
            .any(|t| relation_types.contains(t))
        {
            0.3
        } else {
            0.0
        };

        1.0 / hops + connectivity + relation_bonus
    }
}

/// Fixed prior for a directly-related entity, spatial adjacency highest
fn relation_weight(relation_type: &str) -> f64 {
    match relation_type {
        "NEARBY" => 0.9,
        "HAS_ATTRACTION" => 0.8,
        "HAS_FOOD" => 0.7,
        "HAS_SPECIALTY" => 0.6,
        _ => 0.5,
    }
}

/// Domain relevance of a node type for shortest-path scoring
fn node_type_score(node: &GraphNode) -> f64 {
    if node.has_label("City") {
        1.0
    } else if node.has_label("Attraction") {
        0.9
    } else if node.has_label("Food") || node.has_label("Restaurant") {
        0.8
    } else if node.has_label("Hotel") {
        0.7
    } else if node.has_label("Region") || node.has_label("SubRegion") {
        0.6
    } else {
        0.5
    }
}

fn average_node_score(nodes: &[GraphNode]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    nodes.iter().map(node_type_score).sum::<f64>() / nodes.len() as f64
}

fn ends_on_target(record: &PathRecord, plan: &GraphQuery) -> bool {
    record.nodes.last().is_some_and(|last| {
        last.labels
            .iter()
            .any(|label| plan.target_entities.contains(label))
    })
}

fn to_graph_path(record: PathRecord, relevance_score: f64, path_type: &str) -> GraphPath {
    GraphPath {
        path_length: record.hop_count(),
        nodes: record.nodes,
        relation_types: record.relation_types,
        relevance_score,
        path_type: path_type.to_string(),
    }
}

fn sort_and_truncate(mut paths: Vec<GraphPath>, limit: usize) -> Vec<GraphPath> {
    paths.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    paths.truncate(limit);
    paths
}
