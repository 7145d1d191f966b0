//! In-memory graph and vector store adapters
//!
//! Default backends for development and testing: a petgraph-backed
//! property graph and a brute-force vector index over deterministic
//! embeddings. Both implement the read traits the retrieval engines
//! consume, so an entire pipeline can run without external services.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::core::mock_providers::DeterministicEmbedder;
use crate::core::traits::{GraphStore, Neighborhood, PathRecord, RelationTriple, VectorStore};
use crate::core::{GraphNode, NodeId, Result, VectorHit};

/// In-memory property graph backed by petgraph
///
/// Nodes are indexed by id and by name; traversal queries walk edges in
/// both directions, matching how the travel graph is queried (ownership
/// edges point from container to contained, but proximity questions run
/// against the undirected structure).
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: Graph<GraphNode, String>,
    id_index: HashMap<NodeId, NodeIndex>,
    name_index: HashMap<String, Vec<NodeIndex>>,
}

impl MemoryGraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, indexing it by id and name
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let node_id = node.node_id.clone();
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(node_id, idx);
        self.name_index.entry(name).or_default().push(idx);
        idx
    }

    /// Add a typed edge between two nodes identified by id
    pub fn add_edge(
        &mut self,
        source_id: impl Into<NodeId>,
        relation_type: impl Into<String>,
        target_id: impl Into<NodeId>,
    ) -> Result<()> {
        let source_id = source_id.into();
        let target_id = target_id.into();

        let source = self.id_index.get(&source_id).ok_or_else(|| {
            crate::core::TourRagError::GraphStore {
                message: format!("Source node {source_id} not found"),
            }
        })?;
        let target = self.id_index.get(&target_id).ok_or_else(|| {
            crate::core::TourRagError::GraphStore {
                message: format!("Target node {target_id} not found"),
            }
        })?;

        self.graph.add_edge(*source, *target, relation_type.into());
        Ok(())
    }

    /// Number of nodes in the store
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges in the store
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn indices_by_name(&self, name: &str) -> Vec<NodeIndex> {
        self.name_index.get(name).cloned().unwrap_or_default()
    }

    /// Incident edges of a node in both directions as (other endpoint, type)
    fn undirected_edges(&self, idx: NodeIndex) -> Vec<(NodeIndex, String)> {
        let mut edges = Vec::new();
        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            edges.push((edge.target(), edge.weight().clone()));
        }
        for edge in self.graph.edges_directed(idx, Direction::Incoming) {
            edges.push((edge.source(), edge.weight().clone()));
        }
        edges
    }

    /// Enumerate simple undirected paths from `start`, depth-first
    ///
    /// Every intermediate prefix of length >= 1 is reported as its own
    /// path, mirroring how variable-length pattern matches return one
    /// row per binding.
    fn walk_paths(
        &self,
        start: NodeIndex,
        max_depth: usize,
        limit: usize,
        results: &mut Vec<PathRecord>,
    ) {
        let mut stack: Vec<(Vec<NodeIndex>, Vec<String>)> = vec![(vec![start], Vec::new())];

        while let Some((nodes, relations)) = stack.pop() {
            if results.len() >= limit {
                return;
            }
            if relations.len() >= max_depth {
                continue;
            }

            let last = *nodes.last().unwrap_or(&start);
            for (next, relation_type) in self.undirected_edges(last) {
                if nodes.contains(&next) {
                    continue;
                }
                let mut next_nodes = nodes.clone();
                let mut next_relations = relations.clone();
                next_nodes.push(next);
                next_relations.push(relation_type);

                results.push(self.to_path_record(&next_nodes, &next_relations));
                if results.len() >= limit {
                    return;
                }
                stack.push((next_nodes, next_relations));
            }
        }
    }

    fn to_path_record(&self, nodes: &[NodeIndex], relation_types: &[String]) -> PathRecord {
        PathRecord {
            nodes: nodes
                .iter()
                .filter_map(|idx| self.graph.node_weight(*idx).cloned())
                .collect(),
            relation_types: relation_types.to_vec(),
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn nodes_by_label(&self, label: &str) -> Result<Vec<GraphNode>> {
        Ok(self
            .graph
            .node_weights()
            .filter(|node| node.has_label(label))
            .cloned()
            .collect())
    }

    async fn find_nodes(
        &self,
        label: Option<&str>,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<GraphNode>> {
        let matches = self
            .graph
            .node_weights()
            .filter(|node| label.map_or(true, |l| node.has_label(l)))
            .filter(|node| {
                node.name.contains(fragment)
                    || node
                        .property("description")
                        .is_some_and(|d| d.contains(fragment))
            })
            .take(limit)
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn relationship_triples(&self) -> Result<Vec<RelationTriple>> {
        let triples = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                let target = self.graph.node_weight(edge.target())?;
                Some(RelationTriple::new(
                    source.node_id.clone(),
                    edge.weight().clone(),
                    target.node_id.clone(),
                ))
            })
            .collect();
        Ok(triples)
    }

    async fn paths_from(
        &self,
        source_name: &str,
        max_depth: usize,
        limit: usize,
    ) -> Result<Vec<PathRecord>> {
        let mut results = Vec::new();
        for start in self.indices_by_name(source_name) {
            if results.len() >= limit {
                break;
            }
            self.walk_paths(start, max_depth, limit, &mut results);
        }
        Ok(results)
    }

    async fn paths_between(
        &self,
        source_name: &str,
        target_name: &str,
        max_depth: usize,
        limit: usize,
    ) -> Result<Vec<PathRecord>> {
        let sources = self.indices_by_name(source_name);
        let targets: HashSet<NodeIndex> = self.indices_by_name(target_name).into_iter().collect();
        if sources.is_empty() || targets.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for start in sources {
            // breadth-first parent tracking yields every shortest path
            let mut distances: HashMap<NodeIndex, usize> = HashMap::new();
            let mut parents: HashMap<NodeIndex, Vec<(NodeIndex, String)>> = HashMap::new();
            let mut queue = VecDeque::new();
            distances.insert(start, 0);
            queue.push_back(start);

            let mut reached: Option<NodeIndex> = None;
            while let Some(current) = queue.pop_front() {
                let depth = distances[&current];
                if let Some(hit) = reached {
                    // stop once the frontier passes the hit's layer
                    if depth >= distances[&hit] {
                        break;
                    }
                }
                if depth >= max_depth {
                    continue;
                }
                for (next, relation_type) in self.undirected_edges(current) {
                    match distances.get(&next) {
                        None => {
                            distances.insert(next, depth + 1);
                            parents
                                .entry(next)
                                .or_default()
                                .push((current, relation_type));
                            if targets.contains(&next) && reached.is_none() {
                                reached = Some(next);
                            }
                            queue.push_back(next);
                        }
                        Some(&d) if d == depth + 1 => {
                            parents
                                .entry(next)
                                .or_default()
                                .push((current, relation_type));
                        }
                        Some(_) => {}
                    }
                }
            }

            let Some(end) = reached else { continue };

            // unwind the parent sets into concrete paths
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, Vec<String>)> =
                vec![(end, vec![end], Vec::new())];
            while let Some((current, nodes, relations)) = stack.pop() {
                if results.len() >= limit {
                    return Ok(results);
                }
                if current == start {
                    let ordered_nodes: Vec<NodeIndex> = nodes.iter().rev().copied().collect();
                    let ordered_relations: Vec<String> =
                        relations.iter().rev().cloned().collect();
                    results.push(self.to_path_record(&ordered_nodes, &ordered_relations));
                    continue;
                }
                for (parent, relation_type) in parents.get(&current).into_iter().flatten() {
                    let mut next_nodes = nodes.clone();
                    let mut next_relations = relations.clone();
                    next_nodes.push(*parent);
                    next_relations.push(relation_type.clone());
                    stack.push((*parent, next_nodes, next_relations));
                }
            }
        }
        Ok(results)
    }

    async fn expand_neighborhood(
        &self,
        source_names: &[String],
        max_depth: usize,
        max_nodes: usize,
    ) -> Result<Neighborhood> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut order: Vec<NodeIndex> = Vec::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();

        for name in source_names {
            for idx in self.indices_by_name(name) {
                if visited.insert(idx) {
                    order.push(idx);
                    queue.push_back((idx, 0));
                }
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if order.len() >= max_nodes {
                break;
            }
            if depth >= max_depth {
                continue;
            }
            for (next, _) in self.undirected_edges(current) {
                if order.len() >= max_nodes {
                    break;
                }
                if visited.insert(next) {
                    order.push(next);
                    queue.push_back((next, depth + 1));
                }
            }
        }

        let nodes: Vec<GraphNode> = order
            .iter()
            .filter_map(|idx| self.graph.node_weight(*idx).cloned())
            .collect();

        let relationships = self
            .graph
            .edge_references()
            .filter(|edge| visited.contains(&edge.source()) && visited.contains(&edge.target()))
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                let target = self.graph.node_weight(edge.target())?;
                Some(RelationTriple::new(
                    source.node_id.clone(),
                    edge.weight().clone(),
                    target.node_id.clone(),
                ))
            })
            .collect();

        Ok(Neighborhood {
            nodes,
            relationships,
        })
    }

    async fn neighbor_names(&self, node_id: &NodeId, limit: usize) -> Result<Vec<String>> {
        let Some(&idx) = self.id_index.get(node_id) else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for (neighbor, _) in self.undirected_edges(idx) {
            if names.len() >= limit {
                break;
            }
            if let Some(node) = self.graph.node_weight(neighbor) {
                if seen.insert(node.name.clone()) {
                    names.push(node.name.clone());
                }
            }
        }
        Ok(names)
    }

    async fn node_degree(&self, node_id: &NodeId) -> Result<usize> {
        let Some(&idx) = self.id_index.get(node_id) else {
            return Ok(0);
        };
        Ok(self.undirected_edges(idx).len())
    }
}

struct Fragment {
    id: String,
    content: String,
    embedding: Vec<f32>,
    metadata: HashMap<String, String>,
}

/// Brute-force in-memory vector index
///
/// Embeds fragments with the deterministic hash embedder and answers
/// queries by exact cosine distance over every stored fragment. Scores
/// follow the distance convention consumed by the retrieval engines:
/// lower is more similar.
pub struct MemoryVectorStore {
    embedder: DeterministicEmbedder,
    fragments: Vec<Fragment>,
}

impl MemoryVectorStore {
    /// Create an empty index producing embeddings of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            embedder: DeterministicEmbedder::new(dimension),
            fragments: Vec::new(),
        }
    }

    /// Embed and store a text fragment
    ///
    /// Fragments describing a graph entity should carry its id under the
    /// `node_id` metadata key so merge deduplication can see it.
    pub fn add_fragment(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: HashMap<String, String>,
    ) {
        let content = content.into();
        let embedding = self.embedder.embed(&content);
        self.fragments.push(Fragment {
            id: id.into(),
            content,
            embedding,
            metadata,
        });
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
        // embeddings are L2-normalized, so the dot product is the cosine
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        (1.0 - dot as f64).max(0.0)
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<VectorHit>> {
        let query_embedding = self.embedder.embed(query);

        let mut scored: Vec<(f64, &Fragment)> = self
            .fragments
            .iter()
            .map(|fragment| {
                (
                    Self::cosine_distance(&query_embedding, &fragment.embedding),
                    fragment,
                )
            })
            .collect();
        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, fragment)| VectorHit {
                id: fragment.id.clone(),
                content: fragment.content.clone(),
                score,
                metadata: fragment.metadata.clone(),
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.fragments.len()
    }
}
