//! Knowledge subgraph extraction and structure reasoning
//!
//! For subgraph-shaped queries the engine pulls the local neighborhood
//! of the matched entities out of the store, measures it, and derives
//! short natural-language reasoning chains from the entity and relation
//! types it contains. The empty subgraph is the documented fallback for
//! any store failure.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{
    GraphMetrics, GraphNode, GraphQuery, GraphStore, KnowledgeSubgraph, RelationTriple,
};

/// How many store nodes a single source-entity string may match
const SOURCE_MATCH_LIMIT: usize = 10;
/// Upper bound on reasoning chains returned per query
const MAX_REASONING_CHAINS: usize = 3;

/// Travel vocabulary used to score reasoning chains against the query
const TOURISM_KEYWORDS: [&str; 19] = [
    "旅游", "景点", "酒店", "美食", "餐厅", "交通", "路线", "门票", "开放时间", "地址", "推荐",
    "攻略", "体验", "文化", "历史", "自然", "风光", "住宿", "购物",
];

/// Extracts local knowledge subgraphs around query entities
pub struct SubgraphExtractor {
    store: Arc<dyn GraphStore>,
}

impl SubgraphExtractor {
    /// Create an extractor over the given store
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Extract the neighborhood subgraph for a subgraph-shaped plan
    ///
    /// Central nodes are the store nodes matching the plan's source
    /// entities; connected nodes are everything reached within
    /// `max_depth` hops, capped at `max_nodes`. Store failure yields
    /// the empty subgraph, never an error.
    pub async fn extract_knowledge_subgraph(&self, plan: &GraphQuery) -> KnowledgeSubgraph {
        info!(sources = ?plan.source_entities, "extracting knowledge subgraph");

        let mut seen = HashSet::new();
        let mut central_nodes: Vec<GraphNode> = Vec::new();
        for entity in &plan.source_entities {
            let nodes = match self.store.find_nodes(None, entity, SOURCE_MATCH_LIMIT).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(entity = %entity, error = %e, "subgraph source match failed");
                    return KnowledgeSubgraph::default();
                }
            };
            for node in nodes {
                if seen.insert(node.node_id.clone()) {
                    central_nodes.push(node);
                }
            }
        }

        if central_nodes.is_empty() {
            info!("no central nodes matched, returning empty subgraph");
            return KnowledgeSubgraph::default();
        }

        let names: Vec<String> = central_nodes.iter().map(|n| n.name.clone()).collect();
        let neighborhood = match self
            .store
            .expand_neighborhood(&names, plan.max_depth, plan.max_nodes)
            .await
        {
            Ok(neighborhood) => neighborhood,
            Err(e) => {
                warn!(error = %e, "neighborhood expansion failed, returning empty subgraph");
                return KnowledgeSubgraph::default();
            }
        };

        let central_ids: HashSet<_> = central_nodes.iter().map(|n| n.node_id.clone()).collect();
        let connected_nodes: Vec<GraphNode> = neighborhood
            .nodes
            .into_iter()
            .filter(|node| !central_ids.contains(&node.node_id))
            .collect();

        let metrics = GraphMetrics::measure(connected_nodes.len(), neighborhood.relationships.len());
        info!(
            central = central_nodes.len(),
            connected = connected_nodes.len(),
            relationships = neighborhood.relationships.len(),
            density = metrics.density,
            "knowledge subgraph extracted"
        );

        KnowledgeSubgraph {
            central_nodes,
            connected_nodes,
            relationships: neighborhood.relationships,
            metrics,
            reasoning_chains: Vec::new(),
        }
    }
}

/// Reasoning patterns triggered by the types present in a subgraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReasoningPattern {
    Geographic,
    AttractionAffinity,
    SupportingServices,
    SpatialProximity,
    FoodCulture,
    Accommodation,
    FestivalTiming,
    ThemeAssociation,
    Similarity,
}

impl ReasoningPattern {
    fn label(self) -> &'static str {
        match self {
            Self::Geographic => "地理位置推理",
            Self::AttractionAffinity => "旅游景点相关性推理",
            Self::SupportingServices => "旅游配套服务推理",
            Self::SpatialProximity => "空间邻近性推理",
            Self::FoodCulture => "美食文化推理",
            Self::Accommodation => "住宿便利性推理",
            Self::FestivalTiming => "节庆时间推理",
            Self::ThemeAssociation => "旅游主题关联推理",
            Self::Similarity => "相似性推理",
        }
    }
}

/// Derive validated reasoning chains for a subgraph
///
/// Identifies which patterns the subgraph's labels and relation types
/// trigger, renders one chain per pattern over the actual entity names,
/// then keeps the chains most relevant to the query text, capped at 3.
pub fn graph_structure_reasoning(subgraph: &KnowledgeSubgraph, query: &str) -> Vec<String> {
    let patterns = identify_reasoning_patterns(subgraph);
    let chains: Vec<String> = patterns
        .into_iter()
        .map(|pattern| build_reasoning_chain(pattern, subgraph))
        .collect();

    let validated = validate_reasoning_chains(&chains, query);
    info!(chains = validated.len(), "graph structure reasoning finished");
    validated
}

fn identify_reasoning_patterns(subgraph: &KnowledgeSubgraph) -> Vec<ReasoningPattern> {
    let mut node_types: HashSet<&str> = HashSet::new();
    for node in subgraph.all_nodes() {
        node_types.extend(node.labels.iter().map(String::as_str));
    }
    let relation_types: HashSet<&str> = subgraph
        .relationships
        .iter()
        .map(|r| r.relation_type.as_str())
        .collect();

    let mut patterns = Vec::new();
    if node_types.contains("City") || node_types.contains("Region") {
        patterns.push(ReasoningPattern::Geographic);
    }
    if node_types.contains("Attraction") {
        patterns.push(ReasoningPattern::AttractionAffinity);
    }
    if ["HAS_ATTRACTION", "HAS_FOOD", "HAS_HOTEL"]
        .iter()
        .any(|t| relation_types.contains(t))
    {
        patterns.push(ReasoningPattern::SupportingServices);
    }
    if relation_types.contains("NEARBY") {
        patterns.push(ReasoningPattern::SpatialProximity);
    }
    if node_types.contains("Food") || node_types.contains("Restaurant") {
        patterns.push(ReasoningPattern::FoodCulture);
    }
    if node_types.contains("Hotel") {
        patterns.push(ReasoningPattern::Accommodation);
    }
    if node_types.contains("Festival") {
        patterns.push(ReasoningPattern::FestivalTiming);
    }

    if patterns.is_empty() {
        patterns.push(ReasoningPattern::ThemeAssociation);
        patterns.push(ReasoningPattern::Similarity);
    }
    patterns
}

fn build_reasoning_chain(pattern: ReasoningPattern, subgraph: &KnowledgeSubgraph) -> String {
    match pattern {
        ReasoningPattern::Geographic => build_geographic_chain(subgraph),
        ReasoningPattern::AttractionAffinity => build_attraction_chain(subgraph),
        ReasoningPattern::SupportingServices => build_service_chain(subgraph),
        ReasoningPattern::SpatialProximity => build_spatial_chain(&subgraph.relationships),
        ReasoningPattern::FoodCulture => build_food_chain(subgraph),
        ReasoningPattern::Accommodation => build_accommodation_chain(subgraph),
        ReasoningPattern::FestivalTiming => build_festival_chain(subgraph),
        ReasoningPattern::ThemeAssociation | ReasoningPattern::Similarity => {
            format!("基于{}的旅游推理链", pattern.label())
        }
    }
}

fn names_with_label<'a>(subgraph: &'a KnowledgeSubgraph, label: &str) -> Vec<&'a str> {
    subgraph
        .all_nodes()
        .filter(|node| node.has_label(label))
        .map(|node| node.name.as_str())
        .collect()
}

fn build_geographic_chain(subgraph: &KnowledgeSubgraph) -> String {
    let cities = names_with_label(subgraph, "City");
    let mut regions = names_with_label(subgraph, "Region");
    regions.extend(names_with_label(subgraph, "SubRegion"));

    if !cities.is_empty() && !regions.is_empty() {
        format!(
            "地理位置推理：{}位于{}，形成区域旅游集群",
            cities.join(", "),
            regions.join(", ")
        )
    } else if cities.len() > 1 {
        format!(
            "地理位置推理：{}之间存在地理关联性，可规划旅游路线",
            cities.join(", ")
        )
    } else {
        "地理位置推理：基于地理位置的旅游规划建议".to_string()
    }
}

fn build_attraction_chain(subgraph: &KnowledgeSubgraph) -> String {
    let attractions = names_with_label(subgraph, "Attraction");
    let mut categories: Vec<&str> = subgraph
        .all_nodes()
        .filter(|node| node.has_label("Attraction"))
        .filter_map(|node| node.property("category"))
        .collect();
    categories.sort_unstable();
    categories.dedup();

    let mut chain = format!("景点相关性推理：{}", attractions.join(", "));
    if !categories.is_empty() {
        chain.push_str(&format!("都属于{}类型，", categories.join(", ")));
    }
    chain.push_str("适合同类主题的旅游体验");
    chain
}

fn build_service_chain(subgraph: &KnowledgeSubgraph) -> String {
    let mut dining = names_with_label(subgraph, "Food");
    dining.extend(names_with_label(subgraph, "Restaurant"));
    let lodging = names_with_label(subgraph, "Hotel");

    let mut services = Vec::new();
    if !dining.is_empty() {
        services.push(format!("餐饮({}项)", dining.len()));
    }
    if !lodging.is_empty() {
        services.push(format!("住宿({}项)", lodging.len()));
    }

    format!(
        "旅游配套推理：该目的地提供{}，旅游服务设施完善",
        services.join(", ")
    )
}

fn build_spatial_chain(relationships: &[RelationTriple]) -> String {
    let nearby = relationships
        .iter()
        .filter(|r| r.relation_type == "NEARBY")
        .count();

    if nearby > 0 {
        format!(
            "空间邻近性推理：存在{nearby}组邻近关系，适合步行游览或短途出行"
        )
    } else {
        "空间邻近性推理：基于空间位置安排旅游行程".to_string()
    }
}

fn build_food_chain(subgraph: &KnowledgeSubgraph) -> String {
    let foods = names_with_label(subgraph, "Food");
    let restaurants = names_with_label(subgraph, "Restaurant");

    let mut chain = String::from("美食文化推理：");
    if !foods.is_empty() {
        chain.push_str(&format!("特色美食包括{}", foods.join(", ")));
    }
    if !restaurants.is_empty() {
        if !foods.is_empty() {
            chain.push('，');
        }
        chain.push_str(&format!("推荐餐厅有{}", restaurants.join(", ")));
    }
    chain.push_str("，体现当地饮食文化特色");
    chain
}

fn build_accommodation_chain(subgraph: &KnowledgeSubgraph) -> String {
    let hotels = names_with_label(subgraph, "Hotel");
    if hotels.is_empty() {
        "住宿便利性推理：基于住宿需求安排旅游行程".to_string()
    } else {
        format!(
            "住宿便利性推理：提供{}等住宿选择，满足不同层次需求",
            hotels.join(", ")
        )
    }
}

fn build_festival_chain(subgraph: &KnowledgeSubgraph) -> String {
    let festivals: Vec<String> = subgraph
        .all_nodes()
        .filter(|node| node.has_label("Festival"))
        .map(|node| {
            let time = node.property("time").unwrap_or("时间待定");
            format!("{}({})", node.name, time)
        })
        .collect();

    if festivals.is_empty() {
        "节庆时间推理：考虑当地节庆活动安排旅游时间".to_string()
    } else {
        format!(
            "节庆时间推理：最佳旅游时间为{}期间，体验当地特色文化",
            festivals.join(", ")
        )
    }
}

/// Score each chain by tourism-keyword overlap with the query
///
/// A keyword present in both the query and the chain counts double.
/// Chains scoring >= 2 survive; when three or fewer chains exist they
/// all survive. If fewer than two survive, the first two are kept
/// unconditionally.
fn validate_reasoning_chains(chains: &[String], query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let mut validated = Vec::new();

    for chain in chains {
        let chain_lower = chain.to_lowercase();
        let mut score = 0u32;
        for keyword in TOURISM_KEYWORDS {
            if query.contains(keyword) && chain_lower.contains(keyword) {
                score += 2;
            } else if chain_lower.contains(keyword) {
                score += 1;
            }
        }
        if score >= 2 || chains.len() <= MAX_REASONING_CHAINS {
            validated.push(chain.clone());
        }
    }

    if validated.len() < 2 && !chains.is_empty() {
        validated = chains[..chains.len().min(2)].to_vec();
    }
    validated.truncate(MAX_REASONING_CHAINS);
    validated
}
