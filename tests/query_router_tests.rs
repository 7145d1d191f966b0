//! Query routing across the full retrieval stack: lexical strategy
//! selection driving the graph engine, the hybrid engine, or the
//! deduplicated concatenation of both over one seeded travel graph.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tourrag::config::Config;
use tourrag::core::mock_providers::MockLanguageModel;
use tourrag::core::{GraphNode, GraphStore, LanguageModel, NodeId, TourRagError};
use tourrag::graph::GraphRagEngine;
use tourrag::index::{IndexBuilder, SharedIndex};
use tourrag::query::{QueryRouter, RetrievalStrategy};
use tourrag::retrieval::HybridEngine;
use tourrag::storage::{MemoryGraphStore, MemoryVectorStore};

/// Two cities with attractions, food and lodging, linked by proximity
fn travel_store() -> MemoryGraphStore {
    let mut store = MemoryGraphStore::new();
    store.add_node(
        GraphNode::new("city_hangzhou", vec!["City".to_string()], "杭州")
            .with_property("description", "江南历史文化名城")
            .with_property("best_time", "春秋两季"),
    );
    store.add_node(
        GraphNode::new("city_suzhou", vec!["City".to_string()], "苏州")
            .with_property("description", "园林之城"),
    );
    store.add_node(
        GraphNode::new("attr_westlake", vec!["Attraction".to_string()], "西湖")
            .with_property("city", "杭州")
            .with_property("category", "自然风光"),
    );
    store.add_node(
        GraphNode::new("attr_lingyin", vec!["Attraction".to_string()], "灵隐寺")
            .with_property("city", "杭州")
            .with_property("category", "历史古迹"),
    );
    store.add_node(
        GraphNode::new("attr_humble", vec!["Attraction".to_string()], "拙政园")
            .with_property("city", "苏州")
            .with_property("category", "古典园林"),
    );
    store.add_node(
        GraphNode::new("food_dongpo", vec!["Food".to_string()], "东坡肉")
            .with_property("city", "杭州"),
    );
    store.add_node(GraphNode::new(
        "hotel_westlake",
        vec!["Hotel".to_string()],
        "西湖国宾馆",
    ));
    store
        .add_edge("city_hangzhou", "HAS_ATTRACTION", "attr_westlake")
        .unwrap();
    store
        .add_edge("city_hangzhou", "HAS_ATTRACTION", "attr_lingyin")
        .unwrap();
    store
        .add_edge("city_suzhou", "HAS_ATTRACTION", "attr_humble")
        .unwrap();
    store
        .add_edge("city_hangzhou", "HAS_FOOD", "food_dongpo")
        .unwrap();
    store
        .add_edge("city_hangzhou", "HAS_HOTEL", "hotel_westlake")
        .unwrap();
    store
        .add_edge("city_hangzhou", "NEARBY", "city_suzhou")
        .unwrap();
    store
}

/// One model answering both the intent prompt and the keyword prompt
fn routing_model() -> Arc<MockLanguageModel> {
    Arc::new(
        MockLanguageModel::new("{}")
            .with_response(
                "作为图数据库专家",
                r#"{"query_type": "SUBGRAPH", "source_entities": ["杭州"], "max_depth": 2}"#,
            )
            .with_response(
                "作为旅游知识助手",
                r#"{"entity_keywords": ["杭州"], "topic_keywords": ["景点"]}"#,
            ),
    )
}

async fn seeded_router() -> QueryRouter {
    let store: Arc<dyn GraphStore> = Arc::new(travel_store());
    let builder = IndexBuilder::new(Arc::clone(&store));
    let index = SharedIndex::new(builder.build().await.unwrap());
    let model: Arc<dyn LanguageModel<Error = TourRagError>> = routing_model();
    let config = Config::default();

    let mut vector_store = MemoryVectorStore::new(64);
    vector_store.add_fragment("frag_guide", "杭州三日游攻略速览", HashMap::new());

    let graph = GraphRagEngine::new(Arc::clone(&store), Arc::clone(&model), &config);
    let hybrid = HybridEngine::new(index, store, Arc::new(vector_store), model, &config);
    QueryRouter::new(graph, hybrid)
}

#[tokio::test]
async fn test_relational_query_runs_the_graph_engine() {
    let router = seeded_router().await;

    let (results, analysis) = router.route_query("杭州和苏州之间的关系", 5).await;

    assert_eq!(analysis.recommended_strategy, RetrievalStrategy::GraphRag);
    assert!(analysis.relationship_intensity >= 0.4);
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].content,
        "关于 杭州 的知识网络，包含 6 个相关概念和 6 个关系。"
    );
    // graph results never carry the hybrid merge marker
    assert!(!results[0].metadata.contains_key("search_method"));
}

#[tokio::test]
async fn test_plain_query_runs_the_hybrid_engine() {
    let router = seeded_router().await;

    let (results, analysis) = router.route_query("杭州好玩的地方", 5).await;

    assert_eq!(
        analysis.recommended_strategy,
        RetrievalStrategy::HybridTraditional
    );
    // two dual-level hits interleaved with the single stored fragment
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|r| r.metadata.contains_key("search_method")));
    assert_eq!(
        results[1].metadata.get("search_method"),
        Some(&"vector_enhanced".to_string())
    );
    assert_eq!(results[1].node_type, "Fragment");
}

#[tokio::test]
async fn test_complex_query_merges_graph_and_hybrid_results() {
    let router = seeded_router().await;

    let (results, analysis) = router
        .route_query("为什么这些景点如此受欢迎，有哪些原因影响游客选择", 10)
        .await;

    assert_eq!(analysis.recommended_strategy, RetrievalStrategy::Combined);
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].metadata.get("search_type"),
        Some(&"knowledge_subgraph".to_string())
    );
    // the hybrid copy of the central city deduplicates against the
    // graph summary, leaving the other city and the fragment behind it
    assert_eq!(
        results
            .iter()
            .filter(|r| r.node_id == NodeId::from("city_hangzhou"))
            .count(),
        1
    );
    assert!(results
        .iter()
        .any(|r| r.metadata.get("search_method") == Some(&"vector_enhanced".to_string())));

    let mut seen = HashSet::new();
    for result in &results {
        assert!(seen.insert(result.node_id.clone()), "duplicate node id");
    }
}

#[tokio::test]
async fn test_analysis_serializes_with_snake_case_strategy() {
    let router = seeded_router().await;

    let (_, analysis) = router.route_query("西湖附近的路线", 5).await;

    assert_eq!(analysis.recommended_strategy, RetrievalStrategy::GraphRag);
    let json = serde_json::to_string(&analysis).unwrap();
    assert!(json.contains(r#""recommended_strategy":"graph_rag""#));
    assert!(json.contains(r#""relationship_intensity""#));
    assert!(json.contains(r#""reasoning""#));
}
