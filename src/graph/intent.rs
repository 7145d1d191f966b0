//! Query intent classification
//!
//! Turns a natural-language travel question into a typed [`GraphQuery`]
//! by asking the language model for a structured verdict. The model is
//! treated as unreliable input: timeouts, call failures and unparsable
//! responses all collapse to the same default subgraph plan scoped to
//! the raw query text.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::{GraphQuery, LanguageModel, QueryType, TourRagError};

/// Classifies the graph-topological intent behind a query
pub struct IntentClassifier {
    model: Arc<dyn LanguageModel<Error = TourRagError>>,
    request_timeout: Duration,
}

/// Shape of the model's structured verdict
#[derive(Debug, serde::Deserialize)]
struct IntentResponse {
    query_type: Option<String>,
    #[serde(default)]
    source_entities: Vec<String>,
    #[serde(default)]
    target_entities: Vec<String>,
    #[serde(default)]
    relation_types: Vec<String>,
    max_depth: Option<usize>,
}

impl IntentClassifier {
    /// Create a classifier over the given model
    pub fn new(
        model: Arc<dyn LanguageModel<Error = TourRagError>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            model,
            request_timeout,
        }
    }

    /// Classify the query into a traversal plan
    ///
    /// Never fails: any model misbehavior yields the default subgraph
    /// plan from [`IntentClassifier::fallback_query`].
    pub async fn understand_graph_query(&self, query: &str) -> GraphQuery {
        let prompt = build_intent_prompt(query);

        let response = match timeout(self.request_timeout, self.model.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "intent model call failed, falling back to subgraph plan");
                return Self::fallback_query(query);
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "intent classification timed out, falling back to subgraph plan"
                );
                return Self::fallback_query(query);
            }
        };

        match parse_intent_response(&response) {
            Some(plan) => {
                debug!(query_type = %plan.query_type, sources = plan.source_entities.len(), "intent classified");
                plan
            }
            None => {
                warn!("unparsable intent response, falling back to subgraph plan");
                Self::fallback_query(query)
            }
        }
    }

    /// The default plan: a depth-2 subgraph scoped to the raw query
    pub fn fallback_query(query: &str) -> GraphQuery {
        GraphQuery::new(QueryType::Subgraph, vec![query.to_string()]).with_depth(2)
    }
}

fn build_intent_prompt(query: &str) -> String {
    format!(
        r#"作为图数据库专家，分析以下旅游查询的图结构意图：

查询：{query}

请识别：
1. 查询类型：
   - entity_relation: 询问实体间的直接关系（如：杭州有哪些景点？）
   - multi_hop: 需要多跳推理（如：西湖周边有什么美食？需要：西湖→所在城市→城市美食）
   - subgraph: 需要完整知识网络（如：杭州旅游有什么特色？）
   - path_finding: 路径查找（如：从西湖到千岛湖之间怎么关联？）
   - clustering: 聚类相似性（如：和西湖类似的景点有哪些？）

2. 核心实体：查询中的关键实体名称
3. 目标实体：期望找到的实体类型标签
4. 关系类型：涉及的关系类型
5. 遍历深度：需要的图遍历深度（1-3跳）

返回JSON格式：
{{
    "query_type": "multi_hop",
    "source_entities": ["西湖"],
    "target_entities": ["Food"],
    "relation_types": ["HAS_FOOD", "NEARBY"],
    "max_depth": 2
}}"#
    )
}

/// Parse the model's verdict into a plan
///
/// A response that parses but omits `query_type` defaults to a subgraph
/// plan while keeping the extracted entities. An unknown `query_type`
/// value rejects the whole response.
fn parse_intent_response(response: &str) -> Option<GraphQuery> {
    let payload = extract_json_object(response)?;
    let parsed: IntentResponse = serde_json::from_str(&payload).ok()?;

    let query_type = match parsed.query_type.as_deref() {
        None => QueryType::Subgraph,
        Some(tag) => QueryType::parse(tag)?,
    };

    Some(GraphQuery {
        query_type,
        source_entities: parsed.source_entities,
        target_entities: parsed.target_entities,
        relation_types: parsed.relation_types,
        max_depth: parsed.max_depth.unwrap_or(2),
        max_nodes: 50,
    })
}

/// Extract a JSON object from a model response
///
/// Strips markdown code fences first, then takes the outermost brace
/// window.
fn extract_json_object(response: &str) -> Option<String> {
    let defenced = match Regex::new(r"```(?:json)?") {
        Ok(fence) => fence.replace_all(response, "").into_owned(),
        Err(_) => response.to_string(),
    };
    let start = defenced.find('{')?;
    let end = defenced.rfind('}')?;
    (end > start).then(|| defenced[start..=end].to_string())
}
