//! Configuration for the retrieval core
//!
//! Holds the values the core needs: store connection descriptors, default
//! retrieval bounds, and the model identifier used for text-completion
//! calls. Loading is plain JSON via serde; every field has a default so
//! partial files work.

use std::fs;

use crate::Result;

/// Configuration validation utilities
pub mod validation;

pub use validation::{validate_config_file, Validatable, ValidationResult};

/// Configuration for the retrieval core
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Graph store connection descriptor
    #[serde(default)]
    pub graph_store: GraphStoreConfig,

    /// Vector store connection descriptor
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Retrieval bounds and defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Text-completion model settings
    #[serde(default)]
    pub model: ModelConfig,
}

/// Connection descriptor for the property graph store
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphStoreConfig {
    /// Connection URI (e.g. "bolt://localhost:7687")
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    /// Username for authentication
    #[serde(default = "default_graph_username")]
    pub username: String,

    /// Password for authentication; empty means auth disabled
    #[serde(default)]
    pub password: String,

    /// Database name within the store
    #[serde(default = "default_graph_database")]
    pub database: String,
}

/// Connection descriptor for the vector store
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorStoreConfig {
    /// Collection holding the travel knowledge fragments
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Embedding vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Retrieval bounds applied when callers do not override them
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievalConfig {
    /// Default number of results per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Default traversal depth bound
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Default cap on nodes touched per traversal
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Timeout applied to external LLM and store calls, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Text-completion model settings
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Model identifier passed to the completion endpoint
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Sampling temperature for completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_graph_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_graph_username() -> String {
    "neo4j".to_string()
}

fn default_graph_database() -> String {
    "neo4j".to_string()
}

fn default_collection() -> String {
    "travel_knowledge".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_top_k() -> usize {
    5
}

fn default_max_depth() -> usize {
    2
}

fn default_max_nodes() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_model_id() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_store: GraphStoreConfig::default(),
            vector_store: VectorStoreConfig::default(),
            retrieval: RetrievalConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            username: default_graph_username(),
            password: String::new(),
            database: default_graph_database(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            dimension: default_dimension(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            temperature: default_temperature(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The configured LLM/store call timeout as a `Duration`
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retrieval.timeout_secs)
    }

    /// Fail with a configuration error unless validation passes
    ///
    /// Engines call this once at construction; per-query code never
    /// re-validates.
    pub fn ensure_valid(&self) -> Result<()> {
        let result = self.validate();
        if result.is_valid {
            Ok(())
        } else {
            Err(crate::TourRagError::Config {
                message: result.errors.join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.ensure_valid().is_ok());
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.max_depth, 2);
        assert_eq!(config.retrieval.max_nodes, 50);
        assert_eq!(config.model.model_id, "gpt-3.5-turbo");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "retrieval": { "top_k": 10 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.max_depth, 2);
        assert_eq!(config.graph_store.uri, "bolt://localhost:7687");
    }

    #[test]
    fn test_request_timeout() {
        let mut config = Config::default();
        config.retrieval.timeout_secs = 7;
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(7));
    }

    #[test]
    fn test_roundtrip_file() {
        let config = Config::default();
        let dir = std::env::temp_dir();
        let path = dir.join("tourrag_config_test.json");
        let path_str = path.to_str().unwrap();

        config.save_to_file(path_str).unwrap();
        let loaded = Config::from_file(path_str).unwrap();
        assert_eq!(loaded.retrieval.top_k, config.retrieval.top_k);
        assert_eq!(loaded.graph_store.database, config.graph_store.database);

        let _ = std::fs::remove_file(path);
    }
}
