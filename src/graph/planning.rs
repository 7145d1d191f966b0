//! Complexity-adaptive query planning
//!
//! Grades a query by how many interrogative and relational indicator
//! terms it contains and maps the grade to one or two traversal plans.
//! Simple lookups stay shallow; questions loaded with connective
//! vocabulary get a deep subgraph plan alongside a multi-hop sweep.

use tracing::debug;

use crate::core::{GraphQuery, QueryType};

/// Interrogative and relational terms that signal query complexity
const COMPLEXITY_INDICATORS: [&str; 7] =
    ["什么", "如何", "为什么", "哪些", "关系", "影响", "原因"];

/// Complexity grade in [0, 1]: indicator hits over vocabulary size
pub fn query_complexity(query: &str) -> f64 {
    let hits = COMPLEXITY_INDICATORS
        .iter()
        .filter(|term| query.contains(*term))
        .count();
    (hits as f64 / COMPLEXITY_INDICATORS.len() as f64).min(1.0)
}

/// Map a query to one or two traversal plans by complexity grade
///
/// Below 0.3 a single shallow entity-relation plan suffices; the middle
/// band gets one multi-hop plan; at 0.7 and above a deep subgraph plan
/// runs alongside a deep multi-hop plan and the caller merges both.
pub fn plan_queries(query: &str) -> Vec<GraphQuery> {
    let complexity = query_complexity(query);
    debug!(complexity, "planned query complexity");

    if complexity < 0.3 {
        vec![
            GraphQuery::new(QueryType::EntityRelation, vec![query.to_string()])
                .with_depth(1)
                .with_max_nodes(20),
        ]
    } else if complexity < 0.7 {
        vec![
            GraphQuery::new(QueryType::MultiHop, vec![query.to_string()])
                .with_depth(2)
                .with_max_nodes(50),
        ]
    } else {
        vec![
            GraphQuery::new(QueryType::Subgraph, vec![query.to_string()])
                .with_depth(3)
                .with_max_nodes(100),
            GraphQuery::new(QueryType::MultiHop, vec![query.to_string()])
                .with_depth(3)
                .with_max_nodes(50),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lookup_scores_zero() {
        assert_eq!(query_complexity("西湖"), 0.0);
    }

    #[test]
    fn test_indicator_hits_accumulate() {
        // 什么 + 如何 + 哪些 -> 3/7
        let score = query_complexity("杭州有什么景点，如何前往，有哪些美食");
        assert!((score - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_simple_query_plans_shallow_entity_relation() {
        let plans = plan_queries("西湖门票");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].query_type, QueryType::EntityRelation);
        assert_eq!(plans[0].max_depth, 1);
        assert_eq!(plans[0].max_nodes, 20);
        assert_eq!(plans[0].source_entities, vec!["西湖门票".to_string()]);
    }

    #[test]
    fn test_medium_query_plans_multi_hop() {
        let plans = plan_queries("杭州有什么景点，如何前往，有哪些美食");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].query_type, QueryType::MultiHop);
        assert_eq!(plans[0].max_depth, 2);
        assert_eq!(plans[0].max_nodes, 50);
    }

    #[test]
    fn test_complex_query_plans_subgraph_and_multi_hop() {
        // 为什么 contains 什么, so this hits 5 of 7 indicators
        let plans = plan_queries("为什么西湖和杭州有关系，哪些景点如何安排");
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].query_type, QueryType::Subgraph);
        assert_eq!(plans[0].max_depth, 3);
        assert_eq!(plans[0].max_nodes, 100);
        assert_eq!(plans[1].query_type, QueryType::MultiHop);
        assert_eq!(plans[1].max_depth, 3);
        assert_eq!(plans[1].max_nodes, 50);
    }
}
