//! Deterministic mock providers for offline testing
//!
//! This module provides test doubles for the external collaborator traits
//! that produce deterministic, reproducible results without external API
//! calls. Enables the test suite to run fully offline.
//!
//! # Providers
//!
//! - [`DeterministicEmbedder`] — Hash-based embedding that maps text to
//!   consistent vectors using SHA-256. Same input always yields the same
//!   output. Also used by the in-memory vector store adapter.
//! - [`MockLanguageModel`] — Returns canned responses keyed by prompt
//!   prefix, with a configurable fallback and an optional response delay
//!   for exercising timeouts.
//! - [`FailingGraphStore`] — Fails every query, for exercising the
//!   degradation paths.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::traits::{
    GraphStore, LanguageModel, ModelInfo, Neighborhood, PathRecord, RelationTriple,
};
use crate::core::{GraphNode, NodeId, Result, TourRagError};

/// A deterministic embedder that produces consistent vectors from text via
/// SHA-256.
///
/// The hash is expanded to fill the requested dimension by repeatedly
/// hashing with an incrementing counter, then each byte is mapped to
/// `[-1.0, 1.0]` and L2-normalized. This guarantees:
///
/// - **Determinism**: identical text always yields the identical vector.
/// - **Offline**: no network calls, no GPU, no model weights.
/// - **Distinctness**: different texts produce different vectors
///   (collision-resistant).
#[derive(Debug, Clone)]
pub struct DeterministicEmbedder {
    dimension: usize,
}

impl DeterministicEmbedder {
    /// Create a new deterministic embedder with the given vector dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Embed text into a unit-length vector
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimension);
        let mut counter: u32 = 0;

        while vector.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let hash = hasher.finalize();

            for byte in hash.iter() {
                if vector.len() >= self.dimension {
                    break;
                }
                // Map byte [0,255] to [-1.0, 1.0]
                vector.push((*byte as f32 / 127.5) - 1.0);
            }
            counter += 1;
        }

        // L2-normalize
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }

    /// The configured vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// A mock language model that returns canned responses for testing.
///
/// Responses are matched by prompt prefix: the first registered prefix that
/// matches the beginning of the prompt wins. If no prefix matches, the
/// configurable `default_response` is returned. An optional delay makes
/// every completion sleep first, so timeout handling can be exercised.
#[derive(Debug, Clone)]
pub struct MockLanguageModel {
    responses: HashMap<String, String>,
    default_response: String,
    model_name: String,
    delay: Option<Duration>,
}

impl MockLanguageModel {
    /// Create a new mock language model with a default response.
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: default_response.into(),
            model_name: "mock-llm-v1".to_string(),
            delay: None,
        }
    }

    /// Register a canned response for prompts starting with `prefix`.
    pub fn with_response(mut self, prefix: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(prefix.into(), response.into());
        self
    }

    /// Sleep for `delay` before answering any completion.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn lookup(&self, prompt: &str) -> String {
        for (prefix, response) in &self.responses {
            if prompt.starts_with(prefix.as_str()) {
                return response.clone();
            }
        }
        self.default_response.clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    type Error = TourRagError;

    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lookup(prompt))
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model_name.clone(),
            provider: "mock".to_string(),
        }
    }
}

/// A graph store that fails every query.
///
/// Used to verify that retrieval entry points degrade to empty results
/// instead of surfacing store errors.
#[derive(Debug, Clone, Default)]
pub struct FailingGraphStore;

impl FailingGraphStore {
    fn refuse<T>(&self) -> Result<T> {
        Err(TourRagError::GraphStore {
            message: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl GraphStore for FailingGraphStore {
    async fn nodes_by_label(&self, _label: &str) -> Result<Vec<GraphNode>> {
        self.refuse()
    }

    async fn find_nodes(
        &self,
        _label: Option<&str>,
        _fragment: &str,
        _limit: usize,
    ) -> Result<Vec<GraphNode>> {
        self.refuse()
    }

    async fn relationship_triples(&self) -> Result<Vec<RelationTriple>> {
        self.refuse()
    }

    async fn paths_from(
        &self,
        _source_name: &str,
        _max_depth: usize,
        _limit: usize,
    ) -> Result<Vec<PathRecord>> {
        self.refuse()
    }

    async fn paths_between(
        &self,
        _source_name: &str,
        _target_name: &str,
        _max_depth: usize,
        _limit: usize,
    ) -> Result<Vec<PathRecord>> {
        self.refuse()
    }

    async fn expand_neighborhood(
        &self,
        _source_names: &[String],
        _max_depth: usize,
        _max_nodes: usize,
    ) -> Result<Neighborhood> {
        self.refuse()
    }

    async fn neighbor_names(&self, _node_id: &NodeId, _limit: usize) -> Result<Vec<String>> {
        self.refuse()
    }

    async fn node_degree(&self, _node_id: &NodeId) -> Result<usize> {
        self.refuse()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }
}
