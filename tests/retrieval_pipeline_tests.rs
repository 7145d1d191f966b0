//! End-to-end retrieval pipeline coverage: index construction from a
//! seeded graph store, dual-level retrieval over the built index, the
//! hybrid merge with vector search, and degradation when a backing
//! store goes down mid-flight.

use std::collections::HashMap;
use std::sync::Arc;

use tourrag::config::Config;
use tourrag::core::mock_providers::{FailingGraphStore, MockLanguageModel};
use tourrag::core::{GraphNode, GraphStore, NodeId, RetrievalLevel};
use tourrag::index::{IndexBuilder, SharedIndex};
use tourrag::retrieval::{DualLevelEngine, HybridEngine};
use tourrag::storage::{MemoryGraphStore, MemoryVectorStore};

/// Install a fmt subscriber once so RUST_LOG surfaces pipeline traces
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two cities with attractions, food and lodging, linked by proximity
fn travel_store() -> MemoryGraphStore {
    init_tracing();
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
            .with_property("category", "自然风光")
            .with_property("ticket_price", "免费"),
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
            .with_property("city", "杭州")
            .with_property("category", "传统名菜"),
    );
    store.add_node(
        GraphNode::new("hotel_westlake", vec!["Hotel".to_string()], "西湖国宾馆")
            .with_property("city", "杭州"),
    );
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

fn keyword_model(response: &str) -> Arc<MockLanguageModel> {
    Arc::new(MockLanguageModel::new(response))
}

async fn built_index(store: Arc<MemoryGraphStore>) -> SharedIndex {
    let builder = IndexBuilder::new(store);
    SharedIndex::new(builder.build().await.unwrap())
}

async fn dual_engine(store: Arc<MemoryGraphStore>, keyword_response: &str) -> DualLevelEngine {
    let index = built_index(Arc::clone(&store)).await;
    DualLevelEngine::new(index, store, keyword_model(keyword_response), &Config::default())
}

async fn hybrid_engine(
    store: Arc<MemoryGraphStore>,
    vectors: MemoryVectorStore,
    keyword_response: &str,
) -> HybridEngine {
    let index = built_index(Arc::clone(&store)).await;
    HybridEngine::new(
        index,
        store,
        Arc::new(vectors),
        keyword_model(keyword_response),
        &Config::default(),
    )
}

#[tokio::test]
async fn test_index_build_covers_entities_and_relations() {
    let builder = IndexBuilder::new(Arc::new(travel_store()));
    let index = builder.build().await.unwrap();

    assert_eq!(index.entity_count(), 7);
    assert_eq!(index.relation_count(), 6);

    let stats = index.get_statistics();
    assert_eq!(stats.entities_by_type.get("City"), Some(&2));
    assert_eq!(stats.entities_by_type.get("Attraction"), Some(&3));
    assert_eq!(stats.relations_by_type.get("HAS_ATTRACTION"), Some(&3));

    // relation entries answer to the broader topic label, not just the type tag
    let attractions = index.get_relations_by_key("景点");
    assert_eq!(attractions.len(), 3);
    assert!(attractions
        .iter()
        .any(|r| r.value_content == "杭州 HAS_ATTRACTION 西湖"));
    assert_eq!(index.get_relations_by_key("周边").len(), 1);
}

#[tokio::test]
async fn test_entity_entries_render_tagged_descriptions() {
    let index = IndexBuilder::new(Arc::new(travel_store()))
        .build()
        .await
        .unwrap();

    let hits = index.get_entities_by_key("西湖");
    assert_eq!(hits.len(), 1);
    let entry = hits[0];
    assert_eq!(entry.entity_type, "Attraction");
    assert_eq!(entry.node_id(), NodeId::from("attr_westlake"));
    assert!(entry.value_content.starts_with("景点名称：西湖"));
    assert!(entry.value_content.contains("所在城市: 杭州"));
    assert!(entry.value_content.contains("门票价格: 免费"));

    let city = index.get_entities_by_key("杭州")[0];
    assert!(city.value_content.contains("最佳旅游时间: 春秋两季"));
}

#[tokio::test]
async fn test_dual_level_merges_entity_and_topic_hits() {
    let store = Arc::new(travel_store());
    let engine = dual_engine(
        Arc::clone(&store),
        r#"{"entity_keywords": ["西湖"], "topic_keywords": ["美食"]}"#,
    )
    .await;

    let results = engine.dual_level_retrieval("西湖边有什么好吃的", 5).await;
    assert_eq!(results.len(), 2);

    // the topic relation outranks the entity description
    assert_eq!(results[0].node_id, NodeId::from("city_hangzhou"));
    assert_eq!(results[0].retrieval_level, RetrievalLevel::Topic);
    assert!((results[0].relevance_score - 0.95).abs() < 1e-9);
    assert!(results[0].content.contains("主题: 美食"));
    assert!(results[0].content.contains("相关实体: 杭州、东坡肉"));
    assert!(results[0].content.contains("详情: 城市名称：杭州"));

    assert_eq!(results[1].node_id, NodeId::from("attr_westlake"));
    assert_eq!(results[1].retrieval_level, RetrievalLevel::Entity);
    assert!((results[1].relevance_score - 0.9).abs() < 1e-9);
    assert!(results[1].content.starts_with("景点名称：西湖"));
    assert!(results[1].content.contains("相关信息: 杭州"));
}

#[tokio::test]
async fn test_topic_match_wins_for_node_hit_at_both_levels() {
    let store = Arc::new(travel_store());
    let engine = dual_engine(
        Arc::clone(&store),
        r#"{"entity_keywords": ["杭州"], "topic_keywords": ["景点"]}"#,
    )
    .await;

    let results = engine.dual_level_retrieval("杭州有哪些景点", 5).await;

    // 杭州 surfaces at both levels; the 0.95 topic hit survives dedup
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].node_id, NodeId::from("city_hangzhou"));
    assert_eq!(results[0].retrieval_level, RetrievalLevel::Topic);
    assert!((results[0].relevance_score - 0.95).abs() < 1e-9);
    assert!(results[0].content.contains("杭州 HAS_ATTRACTION 西湖"));
    assert_eq!(results[1].node_id, NodeId::from("city_suzhou"));
}

#[tokio::test]
async fn test_unparsable_keywords_degrade_to_tokenization() {
    let store = Arc::new(travel_store());
    let engine = dual_engine(Arc::clone(&store), "抱歉，无法解析这个查询").await;

    let results = engine.dual_level_retrieval("西湖 美食", 5).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].node_id, NodeId::from("city_hangzhou"));
    assert!((results[0].relevance_score - 0.95).abs() < 1e-9);
    assert_eq!(results[1].node_id, NodeId::from("attr_westlake"));
    assert!((results[1].relevance_score - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_hybrid_interleaves_index_and_vector_sources() {
    let mut vectors = MemoryVectorStore::new(64);
    vectors.add_fragment("frag_tips", "杭州旅游贴士：秋季人流较少", HashMap::new());
    vectors.add_fragment("frag_transport", "杭州市内交通以地铁和公交为主", HashMap::new());

    let engine = hybrid_engine(
        Arc::new(travel_store()),
        vectors,
        r#"{"entity_keywords": ["杭州"], "topic_keywords": []}"#,
    )
    .await;

    let results = engine.hybrid_search("杭州旅游", 5).await;
    assert_eq!(results.len(), 3);

    assert_eq!(
        results[0].metadata.get("search_method"),
        Some(&"dual_level".to_string())
    );
    assert_eq!(results[0].node_id, NodeId::from("city_hangzhou"));
    assert_eq!(
        results[1].metadata.get("search_method"),
        Some(&"vector_enhanced".to_string())
    );
    assert!(results[1].node_id.0.starts_with("fragment_"));
    assert_eq!(results[1].node_type, "Fragment");
    assert_eq!(
        results[2].metadata.get("search_method"),
        Some(&"vector_enhanced".to_string())
    );

    for (position, result) in results.iter().enumerate() {
        assert_eq!(
            result.metadata.get("round_robin_order"),
            Some(&position.to_string())
        );
    }

    // vector scores arrive converted to the unified similarity scale
    for result in &results[1..] {
        assert!(result.relevance_score >= 0.0 && result.relevance_score <= 1.0);
        assert!(result.metadata.contains_key("score"));
    }
}

#[tokio::test]
async fn test_hybrid_truncates_to_top_k_after_merge() {
    let mut vectors = MemoryVectorStore::new(64);
    vectors.add_fragment("frag_tips", "杭州旅游贴士：秋季人流较少", HashMap::new());
    vectors.add_fragment("frag_transport", "杭州市内交通以地铁和公交为主", HashMap::new());

    let engine = hybrid_engine(
        Arc::new(travel_store()),
        vectors,
        r#"{"entity_keywords": ["杭州"], "topic_keywords": ["景点"]}"#,
    )
    .await;

    let results = engine.hybrid_search("杭州有哪些景点", 2).await;
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].metadata.get("search_method"),
        Some(&"dual_level".to_string())
    );
    assert_eq!(
        results[1].metadata.get("search_method"),
        Some(&"vector_enhanced".to_string())
    );
}

#[tokio::test]
async fn test_hybrid_serves_dual_results_when_vector_store_is_empty() {
    let engine = hybrid_engine(
        Arc::new(travel_store()),
        MemoryVectorStore::new(64),
        r#"{"entity_keywords": ["西湖"], "topic_keywords": []}"#,
    )
    .await;

    let results = engine.hybrid_search("西湖介绍", 5).await;
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|r| r.metadata.get("search_method") == Some(&"dual_level".to_string())));
}

#[tokio::test]
async fn test_hybrid_survives_graph_store_outage_with_prebuilt_index() {
    // the index was built while the store was still healthy
    let index = built_index(Arc::new(travel_store())).await;

    let mut vectors = MemoryVectorStore::new(64);
    let mut metadata = HashMap::new();
    metadata.insert("node_id".to_string(), "attr_westlake".to_string());
    metadata.insert("entity_name".to_string(), "西湖".to_string());
    vectors.add_fragment("frag_westlake", "西湖的白堤与苏堤值得一走", metadata);

    let engine = HybridEngine::new(
        index,
        Arc::new(FailingGraphStore),
        Arc::new(vectors),
        keyword_model(r#"{"entity_keywords": ["杭州"], "topic_keywords": ["景点"]}"#),
        &Config::default(),
    );

    let results = engine.hybrid_search("杭州有哪些景点", 5).await;

    // index-backed hits and raw vector hits both survive the outage
    assert_eq!(results.len(), 3);
    let ids: Vec<&str> = results.iter().map(|r| r.node_id.0.as_str()).collect();
    assert!(ids.contains(&"city_hangzhou"));
    assert!(ids.contains(&"city_suzhou"));
    assert!(ids.contains(&"attr_westlake"));
    // neighbor enrichment needs the store, so nothing got any
    assert!(results.iter().all(|r| !r.content.contains("相关信息")));
}

#[tokio::test]
async fn test_index_rebuild_swap_is_visible_to_live_engines() {
    let store_v1 = Arc::new(travel_store());
    let shared = built_index(Arc::clone(&store_v1)).await;
    let engine = DualLevelEngine::new(
        shared.clone(),
        Arc::clone(&store_v1) as Arc<dyn GraphStore>,
        keyword_model(r#"{"entity_keywords": ["千岛湖"], "topic_keywords": []}"#),
        &Config::default(),
    );

    let before = engine.dual_level_retrieval("千岛湖怎么样", 5).await;
    assert!(before.is_empty());

    // rebuild from a store that has since gained the entity
    let mut store_v2 = travel_store();
    store_v2.add_node(
        GraphNode::new("attr_qiandao", vec!["Attraction".to_string()], "千岛湖")
            .with_property("city", "杭州")
            .with_property("category", "自然风光"),
    );
    let rebuilt = IndexBuilder::new(Arc::new(store_v2)).build().await.unwrap();
    shared.replace(rebuilt);

    let after = engine.dual_level_retrieval("千岛湖怎么样", 5).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].node_id, NodeId::from("attr_qiandao"));
    assert!((after[0].relevance_score - 0.9).abs() < 1e-9);
}
