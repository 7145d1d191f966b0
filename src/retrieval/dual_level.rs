//! Dual-level (entity + topic) lexical retrieval
//!
//! Two independent keyword strategies over the key-value index. The
//! entity level resolves concrete names to indexed entity descriptions
//! and enriches them with one-hop neighbors; the topic level resolves
//! thematic keywords through relation entries and categorizable
//! entities. Both degrade through graph-store supplements when the
//! index comes up short, and both feed the combined
//! [`DualLevelEngine::dual_level_retrieval`] entry point.
//!
//! Topic matches deliberately outscore entity matches (0.95 vs 0.9):
//! this retrieval design biases toward thematic relevance when one node
//! surfaces at both levels.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{
    GraphStore, LanguageModel, RetrievalLevel, RetrievalResult, TourRagError,
};
use crate::index::{EntityRecord, SharedIndex};

use super::keywords::KeywordExtractor;

/// Score for an exact entity index hit
const ENTITY_INDEX_SCORE: f64 = 0.9;
/// Score for a substring-match supplement from the graph store
const ENTITY_SUPPLEMENT_SCORE: f64 = 0.7;
/// Score for the last-resort name-only fallback
const ENTITY_FALLBACK_SCORE: f64 = 0.6;
/// Score for a relation entry matched by topic keyword
const TOPIC_RELATION_SCORE: f64 = 0.95;
/// Score for a categorizable entity matched by topic keyword
const TOPIC_CATEGORY_SCORE: f64 = 0.85;
/// Score for a topic supplement from the graph store
const TOPIC_SUPPLEMENT_SCORE: f64 = 0.75;

/// One-hop neighbor names appended to an entity result
const MAX_ENTITY_NEIGHBORS: usize = 2;
/// Related names appended to a topic supplement
const MAX_TOPIC_RELATED: usize = 3;

/// Node labels the store supplements search, in priority order
const SUPPLEMENT_LABELS: [&str; 3] = ["Attraction", "City", "Region"];
/// Entity types eligible for topic-level category matching
const CATEGORY_TYPES: [&str; 5] = ["Attraction", "City", "Region", "Food", "Hotel"];

/// Entity- and topic-level keyword retrieval over the shared index
pub struct DualLevelEngine {
    index: SharedIndex,
    store: Arc<dyn GraphStore>,
    keywords: KeywordExtractor,
}

impl DualLevelEngine {
    /// Build an engine over an index snapshot handle and a graph store
    pub fn new(
        index: SharedIndex,
        store: Arc<dyn GraphStore>,
        model: Arc<dyn LanguageModel<Error = TourRagError>>,
        config: &Config,
    ) -> Self {
        Self {
            index,
            store,
            keywords: KeywordExtractor::new(model, config.request_timeout()),
        }
    }

    /// Keyword extraction followed by both levels, merged and ranked
    ///
    /// Candidates from both levels are sorted by score descending, then
    /// deduplicated by node id with the first occurrence winning, then
    /// truncated to `top_k`.
    pub async fn dual_level_retrieval(&self, query: &str, top_k: usize) -> Vec<RetrievalResult> {
        info!(query = %query, "starting dual-level retrieval");

        let (entity_keywords, topic_keywords) = self.keywords.extract_query_keywords(query).await;

        let mut candidates = self.entity_level_retrieval(&entity_keywords, top_k).await;
        candidates.extend(self.topic_level_retrieval(&topic_keywords, top_k).await);

        let results = rank_and_dedup(candidates, top_k);
        info!(results = results.len(), "dual-level retrieval finished");
        results
    }

    /// Entity-level retrieval: concrete names against the entity index
    ///
    /// Index hits are enriched with up to two one-hop neighbor names.
    /// When the index yields fewer than `top_k` results, the graph store
    /// supplements via substring matching at a reduced score.
    pub async fn entity_level_retrieval(
        &self,
        entity_keywords: &[String],
        top_k: usize,
    ) -> Vec<RetrievalResult> {
        let snapshot = self.index.snapshot();
        let mut results = Vec::new();

        for keyword in entity_keywords {
            for entry in snapshot.get_entities_by_key(keyword) {
                let node_id = entry.node_id();
                let neighbors = match self
                    .store
                    .neighbor_names(&node_id, MAX_ENTITY_NEIGHBORS)
                    .await
                {
                    Ok(names) => names,
                    Err(e) => {
                        debug!(error = %e, node = %node_id, "neighbor enrichment unavailable");
                        Vec::new()
                    }
                };

                let mut content = entry.value_content.clone();
                if !neighbors.is_empty() {
                    content.push_str("\n相关信息: ");
                    content.push_str(&neighbors.join(", "));
                }

                results.push(
                    RetrievalResult::new(
                        content,
                        node_id,
                        entry.entity_type.clone(),
                        ENTITY_INDEX_SCORE,
                        RetrievalLevel::Entity,
                    )
                    .with_metadata("entity_name", entry.entity_name.clone())
                    .with_metadata("entity_type", entry.entity_type.clone())
                    .with_metadata("index_keys", entry.index_keys.join(", "))
                    .with_metadata("matched_keyword", keyword.clone()),
                );
            }
        }

        if results.len() < top_k {
            let supplement = self
                .store_entity_supplement(entity_keywords, top_k - results.len())
                .await;
            results.extend(supplement);
        }

        let results = rank_and_dedup(results, top_k);
        info!(results = results.len(), "entity-level retrieval finished");
        results
    }

    /// Topic-level retrieval: thematic keywords against relation entries
    /// and categorizable entities
    pub async fn topic_level_retrieval(
        &self,
        topic_keywords: &[String],
        top_k: usize,
    ) -> Vec<RetrievalResult> {
        let snapshot = self.index.snapshot();
        let mut results = Vec::new();

        for keyword in topic_keywords {
            for relation in snapshot.get_relations_by_key(keyword) {
                // orphaned entries never reach results
                let (source, target) = match (
                    snapshot.entity_by_id(&relation.source_entity),
                    snapshot.entity_by_id(&relation.target_entity),
                ) {
                    (Some(s), Some(t)) => (s, t),
                    _ => continue,
                };

                let mut lines = vec![
                    format!("主题: {keyword}"),
                    relation.value_content.clone(),
                    format!("相关实体: {}、{}", source.entity_name, target.entity_name),
                ];
                if matches!(
                    source.entity_type.as_str(),
                    "Attraction" | "City" | "Region"
                ) {
                    if let Some(first_line) = source.value_content.lines().next() {
                        lines.push(format!("详情: {first_line}"));
                    }
                }

                results.push(
                    RetrievalResult::new(
                        lines.join("\n"),
                        relation.source_entity.clone(),
                        source.entity_type.clone(),
                        TOPIC_RELATION_SCORE,
                        RetrievalLevel::Topic,
                    )
                    .with_metadata("relation_id", relation.relation_id.to_string())
                    .with_metadata("relation_type", relation.relation_type.clone())
                    .with_metadata("source_name", source.entity_name.clone())
                    .with_metadata("target_name", target.entity_name.clone())
                    .with_metadata("entity_name", source.entity_name.clone())
                    .with_metadata("matched_keyword", keyword.clone()),
                );
            }
        }

        for keyword in topic_keywords {
            for entry in snapshot.get_entities_by_key(keyword) {
                if !CATEGORY_TYPES.contains(&entry.entity_type.as_str()) {
                    continue;
                }
                let content = format!("主题分类: {keyword}\n{}", entry.value_content);
                results.push(
                    RetrievalResult::new(
                        content,
                        entry.node_id(),
                        entry.entity_type.clone(),
                        TOPIC_CATEGORY_SCORE,
                        RetrievalLevel::Topic,
                    )
                    .with_metadata("entity_name", entry.entity_name.clone())
                    .with_metadata("entity_type", entry.entity_type.clone())
                    .with_metadata("matched_keyword", keyword.clone())
                    .with_metadata("source", "category_match"),
                );
            }
        }

        if results.len() < top_k {
            let supplement = self
                .store_topic_supplement(topic_keywords, top_k - results.len())
                .await;
            results.extend(supplement);
        }

        let results = rank_and_dedup(results, top_k);
        info!(results = results.len(), "topic-level retrieval finished");
        results
    }

    /// Substring-match supplement against the graph store
    ///
    /// Renders matched nodes through the same tagged records the index
    /// uses, so supplement content reads identically to index content.
    /// Any store failure drops this pass down to the name-only fallback.
    async fn store_entity_supplement(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Vec<RetrievalResult> {
        let per_type_limit = (limit / 3).max(3);
        let mut results = Vec::new();

        for keyword in keywords {
            for label in SUPPLEMENT_LABELS {
                let nodes = match self.store.find_nodes(Some(label), keyword, per_type_limit).await
                {
                    Ok(nodes) => nodes,
                    Err(e) => {
                        warn!(error = %e, "store supplement failed, trying name-only fallback");
                        return self.simple_entity_fallback(keywords, limit).await;
                    }
                };

                for node in nodes {
                    let Some(record) = EntityRecord::from_node(&node) else {
                        continue;
                    };
                    results.push(
                        RetrievalResult::new(
                            record.value_content(),
                            node.node_id.clone(),
                            record.entity_type(),
                            ENTITY_SUPPLEMENT_SCORE,
                            RetrievalLevel::Entity,
                        )
                        .with_metadata("entity_name", node.name.clone())
                        .with_metadata("matched_keyword", keyword.clone())
                        .with_metadata("source", "store_contains"),
                    );
                    if results.len() >= limit {
                        return results;
                    }
                }
            }
        }
        results
    }

    /// Name-only fallback when richer supplement queries fail
    async fn simple_entity_fallback(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Vec<RetrievalResult> {
        let mut results = Vec::new();

        for label in SUPPLEMENT_LABELS {
            let nodes = match self.store.nodes_by_label(label).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(error = %e, label, "name-only fallback query failed");
                    continue;
                }
            };

            for node in nodes {
                if !keywords.iter().any(|kw| node.name.contains(kw.as_str())) {
                    continue;
                }
                let mut content = format!("{}: {}", type_caption(label), node.name);
                if let Some(description) = node.property("description") {
                    content.push_str(&format!("\n描述: {description}"));
                }
                results.push(
                    RetrievalResult::new(
                        content,
                        node.node_id.clone(),
                        node.primary_label(),
                        ENTITY_FALLBACK_SCORE,
                        RetrievalLevel::Entity,
                    )
                    .with_metadata("entity_name", node.name.clone())
                    .with_metadata("source", "name_match_fallback"),
                );
                if results.len() >= limit {
                    return results;
                }
            }
        }
        results
    }

    /// Topic supplement: description/category substring matches with
    /// related names attached
    async fn store_topic_supplement(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Vec<RetrievalResult> {
        let mut results = Vec::new();

        for keyword in keywords {
            for label in SUPPLEMENT_LABELS {
                let nodes = match self.store.find_nodes(Some(label), keyword, limit).await {
                    Ok(nodes) => nodes,
                    Err(e) => {
                        warn!(error = %e, "topic supplement query failed");
                        return results;
                    }
                };

                for node in nodes {
                    let mut parts = vec![format!("{}: {}", type_caption(label), node.name)];
                    if let Some(description) = node.property("description") {
                        parts.push(format!("描述: {description}"));
                    }
                    match label {
                        "Attraction" => {
                            if let Some(price) = node.property("ticket_price") {
                                parts.push(format!("门票: {price}"));
                            }
                            if let Some(category) = node.property("category") {
                                parts.push(format!("类别: {category}"));
                            }
                        }
                        "City" => {
                            if let Some(best) = node.property("best_time") {
                                parts.push(format!("最佳旅游时间: {best}"));
                            }
                            parts.push("类别: 旅游城市".to_string());
                        }
                        "Region" => parts.push("类别: 旅游地区".to_string()),
                        _ => {}
                    }

                    let related = self
                        .store
                        .neighbor_names(&node.node_id, MAX_TOPIC_RELATED)
                        .await
                        .unwrap_or_default();
                    if !related.is_empty() {
                        parts.push(format!("相关景点: {}", related.join(", ")));
                    }

                    results.push(
                        RetrievalResult::new(
                            parts.join("\n"),
                            node.node_id.clone(),
                            node.primary_label(),
                            TOPIC_SUPPLEMENT_SCORE,
                            RetrievalLevel::Topic,
                        )
                        .with_metadata("entity_name", node.name.clone())
                        .with_metadata("matched_keyword", keyword.clone())
                        .with_metadata("source", "store_topic"),
                    );
                    if results.len() >= limit {
                        return results;
                    }
                }
            }
        }
        results
    }
}

fn type_caption(label: &str) -> &'static str {
    match label {
        "City" => "城市",
        "Attraction" => "景点",
        "Region" => "地区",
        _ => "条目",
    }
}

/// Sort by score descending, keep the first occurrence per node id,
/// truncate
fn rank_and_dedup(mut candidates: Vec<RetrievalResult>, top_k: usize) -> Vec<RetrievalResult> {
    candidates.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for candidate in candidates {
        if seen.insert(candidate.node_id.clone()) {
            unique.push(candidate);
            if unique.len() == top_k {
                break;
            }
        }
    }
    unique
}
