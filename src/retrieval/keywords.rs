//! Dual-level query keyword extraction
//!
//! Splits a travel query into entity-level keywords (concrete places)
//! and topic-level keywords (themes and activity types) by asking the
//! language model for a strict JSON verdict. A response that cannot be
//! parsed, errors out or times out degrades to naive whitespace
//! tokenization; both levels still get keywords, just cruder ones.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::core::{LanguageModel, TourRagError};

/// Extracts entity- and topic-level keywords from a query
pub struct KeywordExtractor {
    model: Arc<dyn LanguageModel<Error = TourRagError>>,
    request_timeout: Duration,
}

/// Shape of the model's keyword verdict
#[derive(Debug, serde::Deserialize)]
struct KeywordResponse {
    #[serde(default)]
    entity_keywords: Vec<String>,
    #[serde(default)]
    topic_keywords: Vec<String>,
}

impl KeywordExtractor {
    /// Create an extractor backed by the given model
    pub fn new(
        model: Arc<dyn LanguageModel<Error = TourRagError>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            model,
            request_timeout,
        }
    }

    /// Split a query into `(entity_keywords, topic_keywords)`
    ///
    /// Never fails: any model problem falls back to whitespace
    /// tokenization, first 3 tokens as entities and the next up to 3 as
    /// topics.
    pub async fn extract_query_keywords(&self, query: &str) -> (Vec<String>, Vec<String>) {
        let prompt = build_keyword_prompt(query);

        let response = match timeout(self.request_timeout, self.model.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "keyword model call failed, tokenizing instead");
                return fallback_keywords(query);
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "keyword extraction timed out, tokenizing instead"
                );
                return fallback_keywords(query);
            }
        };

        match parse_keyword_response(&response) {
            Some((entity_keywords, topic_keywords)) => {
                info!(
                    entity = ?entity_keywords,
                    topic = ?topic_keywords,
                    "query keywords extracted"
                );
                (entity_keywords, topic_keywords)
            }
            None => {
                warn!("unparsable keyword response, tokenizing instead");
                fallback_keywords(query)
            }
        }
    }
}

fn build_keyword_prompt(query: &str) -> String {
    format!(
        r#"作为旅游知识助手，请分析以下查询并提取关键词，分为两个层次：

查询：{query}

提取规则：
1. 实体级关键词：具体的地点、景点、城市、酒店、餐厅、特产等有形实体；对于抽象查询，推测相关的具体地点
2. 主题级关键词：抽象概念、旅游主题、活动类型、旅游风格、季节等；排除动作词（推荐、介绍、怎么去等）

示例：
查询："推荐几个历史古迹"
{{
    "entity_keywords": ["故宫", "天坛", "颐和园"],
    "topic_keywords": ["历史古迹", "古建筑", "文化遗产"]
}}

请严格按照JSON格式返回，不要包含多余的文字：
{{
    "entity_keywords": ["实体1", "实体2"],
    "topic_keywords": ["主题1", "主题2"]
}}"#
    )
}

fn parse_keyword_response(response: &str) -> Option<(Vec<String>, Vec<String>)> {
    let payload = extract_json_object(response)?;
    let parsed: KeywordResponse = serde_json::from_str(&payload).ok()?;
    Some((parsed.entity_keywords, parsed.topic_keywords))
}

/// Whitespace tokenization fallback
///
/// First 3 tokens become entity keywords. Topic keywords are tokens 4-6
/// when more than three exist, otherwise the full token list repeats at
/// both levels.
fn fallback_keywords(query: &str) -> (Vec<String>, Vec<String>) {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_string).collect();
    let entity_keywords: Vec<String> = tokens.iter().take(3).cloned().collect();
    let topic_keywords = if tokens.len() > 3 {
        tokens[3..tokens.len().min(6)].to_vec()
    } else {
        tokens
    };
    (entity_keywords, topic_keywords)
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
