//! Hybrid retrieval: dual-level graph results merged with dense vector hits
//!
//! The hybrid engine runs the dual-level retrieval and an enhanced vector
//! search concurrently, then interleaves the two result lists round-robin
//! so that neither source dominates the head of the final ranking. Vector
//! hits are enriched with graph context before the merge: a hit that names
//! a graph node gets the node's immediate neighbors appended to its
//! content.
//!
//! Scores are unified at merge time. Dual-level results keep their tier
//! score; vector results arrive with a cosine-distance score that is
//! converted to a similarity, with the raw distance preserved under the
//! `score` metadata key. Either source failing degrades to an empty
//! contribution from that side rather than an error.

use std::collections::HashSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{
    GraphStore, LanguageModel, NodeId, RetrievalLevel, RetrievalResult, TourRagError, VectorStore,
};
use crate::index::SharedIndex;
use crate::retrieval::dual_level::DualLevelEngine;

/// Neighbor names appended to a vector hit during enhancement
const MAX_VECTOR_NEIGHBORS: usize = 3;

/// Node type assigned to vector fragments with no graph identity
const FRAGMENT_TYPE: &str = "Fragment";

/// Merges dual-level and vector retrieval into one ranked list
pub struct HybridEngine {
    dual: DualLevelEngine,
    vector_store: Arc<dyn VectorStore>,
    store: Arc<dyn GraphStore>,
}

impl HybridEngine {
    /// Build a hybrid engine over the index, both stores, and the keyword model
    pub fn new(
        index: SharedIndex,
        store: Arc<dyn GraphStore>,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn LanguageModel<Error = TourRagError>>,
        config: &Config,
    ) -> Self {
        Self {
            dual: DualLevelEngine::new(index, Arc::clone(&store), model, config),
            vector_store,
            store,
        }
    }

    /// Dual-level and vector retrieval, interleaved round-robin
    ///
    /// Both sub-retrievals run concurrently. The merged list alternates
    /// dual-level and vector results by rank, deduplicates on node id,
    /// and is truncated to `top_k`. Each accepted result records its
    /// origin under `search_method` and its merge position under
    /// `round_robin_order`.
    pub async fn hybrid_search(&self, query: &str, top_k: usize) -> Vec<RetrievalResult> {
        info!(query = %query, top_k, "starting hybrid retrieval");

        let (dual_docs, vector_docs) = tokio::join!(
            self.dual.dual_level_retrieval(query, top_k),
            self.vector_search_enhanced(query, top_k),
        );

        debug!(
            dual = dual_docs.len(),
            vector = vector_docs.len(),
            "merging retrieval sources"
        );
        let merged = round_robin_merge(dual_docs, vector_docs, top_k);
        info!(results = merged.len(), "hybrid retrieval finished");
        merged
    }

    /// Vector search with graph-context enhancement
    ///
    /// Requests `2 * top_k` hits so that enhancement and the later merge
    /// have slack to draw on, appends up to [`MAX_VECTOR_NEIGHBORS`]
    /// neighbor names to every hit that identifies a graph node, and
    /// truncates to `top_k` afterwards. Scores keep the store's distance
    /// convention here; the hybrid merge converts them. A failing vector
    /// store contributes nothing.
    pub async fn vector_search_enhanced(&self, query: &str, top_k: usize) -> Vec<RetrievalResult> {
        let hits = match self.vector_store.search(query, top_k * 2).await {
            Ok(hits) => hits,
            Err(error) => {
                warn!(%error, "vector search failed, continuing without vector results");
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for hit in hits {
            let mut content = hit.content.clone();
            let node_id = hit.node_id();

            if let Some(id) = &node_id {
                match self.store.neighbor_names(id, MAX_VECTOR_NEIGHBORS).await {
                    Ok(neighbors) if !neighbors.is_empty() => {
                        content.push_str("\n相关信息: ");
                        content.push_str(&neighbors.join(", "));
                    }
                    Ok(_) => {}
                    Err(error) => {
                        debug!(node_id = %id, %error, "neighbor lookup failed during enhancement");
                    }
                }
            }

            let entity_name = hit
                .metadata
                .get("entity_name")
                .cloned()
                .unwrap_or_else(|| hit.id.clone());
            let node_type = hit
                .metadata
                .get("node_type")
                .cloned()
                .unwrap_or_else(|| FRAGMENT_TYPE.to_string());
            let result_id = match node_id {
                Some(id) => id,
                None => fragment_id(&content),
            };

            results.push(
                RetrievalResult::new(
                    content,
                    result_id,
                    node_type,
                    hit.score,
                    RetrievalLevel::Vector,
                )
                .with_metadata("entity_name", entity_name)
                .with_metadata("score", hit.score.to_string())
                .with_metadata("search_type", "vector_enhanced"),
            );
        }

        results.truncate(top_k);
        results
    }
}

/// Synthesize a stable id for a fragment with no graph identity
///
/// The id hashes the fragment's (enhanced) content, so identical text
/// deduplicates at merge time even across retrieval runs.
fn fragment_id(content: &str) -> NodeId {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        hex.push_str(&format!("{byte:02x}"));
    }
    NodeId::new(format!("fragment_{hex}"))
}

/// Interleave the two result lists rank by rank
///
/// Position `i` contributes the dual-level result first, then the vector
/// result, skipping node ids already accepted. Vector scores are
/// converted from distance to similarity as they are accepted; dual
/// scores pass through unchanged.
fn round_robin_merge(
    dual_docs: Vec<RetrievalResult>,
    vector_docs: Vec<RetrievalResult>,
    top_k: usize,
) -> Vec<RetrievalResult> {
    let mut dual: Vec<Option<RetrievalResult>> = dual_docs.into_iter().map(Some).collect();
    let mut vector: Vec<Option<RetrievalResult>> = vector_docs.into_iter().map(Some).collect();

    let mut merged = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();

    for i in 0..dual.len().max(vector.len()) {
        if let Some(doc) = dual.get_mut(i).and_then(Option::take) {
            accept(&mut merged, &mut seen, doc, "dual_level");
        }
        if let Some(doc) = vector.get_mut(i).and_then(Option::take) {
            accept(&mut merged, &mut seen, doc, "vector_enhanced");
        }
    }

    merged.truncate(top_k);
    merged
}

fn accept(
    merged: &mut Vec<RetrievalResult>,
    seen: &mut HashSet<NodeId>,
    mut doc: RetrievalResult,
    method: &'static str,
) {
    if !seen.insert(doc.node_id.clone()) {
        return;
    }
    if method == "vector_enhanced" {
        doc.relevance_score = similarity_from_distance(doc.relevance_score);
    }
    doc.metadata
        .insert("search_method".to_string(), method.to_string());
    doc.metadata
        .insert("round_robin_order".to_string(), merged.len().to_string());
    merged.push(doc);
}

/// Convert a cosine-distance score into the unified similarity scale
///
/// Distances at or below 1.0 map to `1 - distance`; anything beyond that
/// clamps to zero.
fn similarity_from_distance(score: f64) -> f64 {
    if score <= 1.0 {
        (1.0 - score).max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::core::mock_providers::{FailingGraphStore, MockLanguageModel};
    use crate::core::{GraphNode, Result, VectorHit};
    use crate::index::{IndexBuilder, SharedIndex};
    use crate::storage::{MemoryGraphStore, MemoryVectorStore};

    fn seeded_store() -> MemoryGraphStore {
        let mut store = MemoryGraphStore::new();
        store.add_node(
            GraphNode::new("city_hangzhou", vec!["City".to_string()], "杭州")
                .with_property("description", "历史文化名城")
                .with_property("best_time", "春秋"),
        );
        store.add_node(
            GraphNode::new("attr_westlake", vec!["Attraction".to_string()], "西湖")
                .with_property("city", "杭州")
                .with_property("category", "自然风光"),
        );
        store
            .add_edge("city_hangzhou", "HAS_ATTRACTION", "attr_westlake")
            .unwrap();
        store
    }

    async fn seeded_index(store: Arc<MemoryGraphStore>) -> SharedIndex {
        let index = IndexBuilder::new(store).build().await.unwrap();
        SharedIndex::new(index)
    }

    fn keyword_model(response: &str) -> Arc<MockLanguageModel> {
        Arc::new(MockLanguageModel::new(response))
    }

    async fn engine_with(
        vector_store: Arc<dyn VectorStore>,
        keyword_response: &str,
    ) -> HybridEngine {
        let store = Arc::new(seeded_store());
        let index = seeded_index(Arc::clone(&store)).await;
        HybridEngine::new(
            index,
            store,
            vector_store,
            keyword_model(keyword_response),
            &Config::default(),
        )
    }

    fn dual_doc(id: &str, score: f64) -> RetrievalResult {
        RetrievalResult::new(
            format!("dual content {id}"),
            id,
            "City",
            score,
            RetrievalLevel::Entity,
        )
    }

    fn vector_doc(id: &str, score: f64) -> RetrievalResult {
        RetrievalResult::new(
            format!("vector content {id}"),
            id,
            "Fragment",
            score,
            RetrievalLevel::Vector,
        )
        .with_metadata("score", score.to_string())
    }

    struct FailingVectorStore;

    #[async_trait]
    impl VectorStore for FailingVectorStore {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<VectorHit>> {
            Err(TourRagError::VectorStore {
                message: "index unavailable".to_string(),
            })
        }

        async fn len(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_round_robin_alternates_sources() {
        let dual = vec![dual_doc("a", 0.9), dual_doc("b", 0.85), dual_doc("c", 0.7)];
        let vector = vec![vector_doc("x", 0.2), vector_doc("y", 0.4)];

        let merged = round_robin_merge(dual, vector, 10);

        let ids: Vec<&str> = merged.iter().map(|r| r.node_id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "x", "b", "y", "c"]);

        for (position, result) in merged.iter().enumerate() {
            assert_eq!(
                result.metadata.get("round_robin_order"),
                Some(&position.to_string())
            );
        }
        assert_eq!(
            merged[0].metadata.get("search_method"),
            Some(&"dual_level".to_string())
        );
        assert_eq!(
            merged[1].metadata.get("search_method"),
            Some(&"vector_enhanced".to_string())
        );
    }

    #[test]
    fn test_round_robin_union_when_disjoint() {
        let dual = vec![dual_doc("a", 0.9), dual_doc("b", 0.85)];
        let vector = vec![vector_doc("x", 0.1), vector_doc("y", 0.3), vector_doc("z", 0.5)];

        let merged = round_robin_merge(dual, vector, 10);
        assert_eq!(merged.len(), 5);
    }

    #[test]
    fn test_merge_dedup_prefers_first_acceptance() {
        let dual = vec![dual_doc("city_hangzhou", 0.9)];
        let vector = vec![vector_doc("city_hangzhou", 0.3)];

        let merged = round_robin_merge(dual, vector, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].metadata.get("search_method"),
            Some(&"dual_level".to_string())
        );
        assert!((merged[0].relevance_score - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_converts_vector_distance_to_similarity() {
        let vector = vec![vector_doc("x", 0.2), vector_doc("y", 1.5)];

        let merged = round_robin_merge(Vec::new(), vector, 10);
        assert!((merged[0].relevance_score - 0.8).abs() < 1e-9);
        assert!((merged[1].relevance_score - 0.0).abs() < f64::EPSILON);
        // raw distance survives in metadata
        assert_eq!(merged[0].metadata.get("score"), Some(&"0.2".to_string()));
        assert_eq!(merged[1].metadata.get("score"), Some(&"1.5".to_string()));
    }

    #[test]
    fn test_merge_truncates_to_top_k() {
        let dual = vec![dual_doc("a", 0.9), dual_doc("b", 0.8)];
        let vector = vec![vector_doc("x", 0.1), vector_doc("y", 0.2)];

        let merged = round_robin_merge(dual, vector, 3);
        let ids: Vec<&str> = merged.iter().map(|r| r.node_id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "x", "b"]);
    }

    #[test]
    fn test_similarity_conversion_bounds() {
        assert!((similarity_from_distance(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((similarity_from_distance(1.0) - 0.0).abs() < f64::EPSILON);
        assert!((similarity_from_distance(1.01) - 0.0).abs() < f64::EPSILON);
        assert!((similarity_from_distance(-0.5) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fragment_id_is_stable() {
        let a = fragment_id("同一段文字");
        let b = fragment_id("同一段文字");
        let c = fragment_id("另一段文字");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.0.starts_with("fragment_"));
    }

    #[tokio::test]
    async fn test_vector_search_appends_neighbor_context() {
        let mut vector_store = MemoryVectorStore::new(64);
        let mut metadata = HashMap::new();
        metadata.insert("node_id".to_string(), "attr_westlake".to_string());
        metadata.insert("entity_name".to_string(), "西湖".to_string());
        vector_store.add_fragment("frag_westlake", "西湖是杭州的著名景点", metadata);

        let engine = engine_with(
            Arc::new(vector_store),
            r#"{"entity_keywords": [], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.vector_search_enhanced("西湖", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node_id, NodeId::from("attr_westlake"));
        assert!(results[0].content.contains("相关信息: 杭州"));
        assert_eq!(results[0].retrieval_level, RetrievalLevel::Vector);
        // distance convention preserved before the merge
        let raw: f64 = results[0].metadata.get("score").unwrap().parse().unwrap();
        assert!((results[0].relevance_score - raw).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_vector_search_synthesizes_fragment_ids() {
        let mut vector_store = MemoryVectorStore::new(64);
        vector_store.add_fragment("frag_plain", "一段没有图谱关联的文本", HashMap::new());

        let engine = engine_with(
            Arc::new(vector_store),
            r#"{"entity_keywords": [], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.vector_search_enhanced("文本", 5).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].node_id.0.starts_with("fragment_"));
        assert_eq!(results[0].node_type, "Fragment");
    }

    #[tokio::test]
    async fn test_vector_search_failure_contributes_nothing() {
        let engine = engine_with(
            Arc::new(FailingVectorStore),
            r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.vector_search_enhanced("杭州", 5).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_hybrid_search_merges_both_sources() {
        let mut vector_store = MemoryVectorStore::new(64);
        vector_store.add_fragment("frag_plain", "杭州旅游攻略速览", HashMap::new());

        let engine = engine_with(
            Arc::new(vector_store),
            r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.hybrid_search("杭州有什么好玩的", 10).await;
        assert!(!results.is_empty());
        assert_eq!(
            results[0].metadata.get("search_method"),
            Some(&"dual_level".to_string())
        );
        assert!(results.iter().any(|r| {
            r.metadata.get("search_method") == Some(&"vector_enhanced".to_string())
        }));
        for (position, result) in results.iter().enumerate() {
            assert_eq!(
                result.metadata.get("round_robin_order"),
                Some(&position.to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_hybrid_search_survives_failing_vector_store() {
        let engine = engine_with(
            Arc::new(FailingVectorStore),
            r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.hybrid_search("杭州", 5).await;
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|r| r.metadata.get("search_method") == Some(&"dual_level".to_string())));
    }

    #[tokio::test]
    async fn test_hybrid_search_survives_failing_graph_store() {
        let mut vector_store = MemoryVectorStore::new(64);
        vector_store.add_fragment("frag_plain", "杭州旅游速览", HashMap::new());

        let index = seeded_index(Arc::new(seeded_store())).await;

        // swap in a failing graph store after the index snapshot exists
        let engine = HybridEngine::new(
            index,
            Arc::new(FailingGraphStore),
            Arc::new(vector_store),
            keyword_model(r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#),
            &Config::default(),
        );

        let results = engine.hybrid_search("杭州", 5).await;
        // index-backed dual results and un-enhanced vector hits both survive
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| !r.content.is_empty()));
    }

    #[tokio::test]
    async fn test_hybrid_search_dedups_graph_backed_fragment() {
        let mut vector_store = MemoryVectorStore::new(64);
        let mut metadata = HashMap::new();
        metadata.insert("node_id".to_string(), "city_hangzhou".to_string());
        vector_store.add_fragment("frag_hz", "杭州城市介绍", metadata);

        let engine = engine_with(
            Arc::new(vector_store),
            r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#,
        )
        .await;

        let results = engine.hybrid_search("杭州", 10).await;
        let hangzhou_count = results
            .iter()
            .filter(|r| r.node_id == NodeId::from("city_hangzhou"))
            .count();
        assert_eq!(hangzhou_count, 1);
        // dual acceptance wins the slot for the shared node id
        let hangzhou = results
            .iter()
            .find(|r| r.node_id == NodeId::from("city_hangzhou"))
            .unwrap();
        assert_eq!(
            hangzhou.metadata.get("search_method"),
            Some(&"dual_level".to_string())
        );
    }

    #[tokio::test]
    async fn test_unparsable_keyword_response_still_yields_results() {
        let mut vector_store = MemoryVectorStore::new(64);
        vector_store.add_fragment("frag_plain", "杭州旅游速览", HashMap::new());

        // fallback keywords drive the dual level; vector side is unaffected
        let engine = engine_with(Arc::new(vector_store), "抱歉，无法解析这个查询").await;

        let results = engine.hybrid_search("杭州", 5).await;
        assert!(!results.is_empty());
    }
}
