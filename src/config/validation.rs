use std::path::Path;

use crate::config::Config;
use crate::{Result, TourRagError};

/// Result of configuration validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Whether the configuration is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings
    pub warnings: Vec<String>,
    /// List of optimization suggestions
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    /// Create a new validation result
    pub fn new() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Add an error and mark validation as failed
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.is_valid = false;
    }

    /// Add a warning (doesn't affect validity)
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add an optimization suggestion
    pub fn add_suggestion(&mut self, suggestion: String) {
        self.suggestions.push(suggestion);
    }
}

/// Trait for configuration validation
pub trait Validatable {
    /// Validate configuration with standard checks
    fn validate(&self) -> ValidationResult;
    /// Validate configuration with strict checks (includes warnings and suggestions)
    fn validate_strict(&self) -> ValidationResult;
}

impl Validatable for Config {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Validate graph store descriptor
        if self.graph_store.uri.is_empty() {
            result.add_error("Graph store uri cannot be empty".to_string());
        }
        if self.graph_store.username.is_empty() {
            result.add_error("Graph store username cannot be empty".to_string());
        }
        if self.graph_store.password.is_empty() {
            result.add_warning(
                "Graph store password is empty, assuming auth is disabled".to_string(),
            );
        }
        if self.graph_store.database.is_empty() {
            result.add_error("Graph store database cannot be empty".to_string());
        }

        // Validate vector store descriptor
        if self.vector_store.collection.is_empty() {
            result.add_error("Vector store collection cannot be empty".to_string());
        }
        if self.vector_store.dimension == 0 {
            result.add_error("Vector dimension must be greater than 0".to_string());
        }

        // Validate retrieval bounds
        if self.retrieval.top_k == 0 {
            result.add_error("Top-k must be greater than 0".to_string());
        } else if self.retrieval.top_k > 100 {
            result.add_warning(
                "Top-k is very high (>100), this may affect performance".to_string(),
            );
        } else {
            // Top-k is in acceptable range
        }

        if self.retrieval.max_depth == 0 {
            result.add_error("Max traversal depth must be greater than 0".to_string());
        } else if self.retrieval.max_depth > 5 {
            result.add_warning(
                "Max traversal depth is very high (>5), traversals may be slow".to_string(),
            );
        } else {
            // Depth is in acceptable range
        }

        if self.retrieval.max_nodes == 0 {
            result.add_error("Max nodes must be greater than 0".to_string());
        } else if self.retrieval.max_nodes > 1000 {
            result.add_warning(
                "Max nodes is very high (>1000), subgraph extraction may be slow".to_string(),
            );
        } else {
            // Node cap is in acceptable range
        }

        if self.retrieval.timeout_secs == 0 {
            result.add_error("Request timeout must be greater than 0".to_string());
        }

        // Validate model settings
        if self.model.model_id.is_empty() {
            result.add_error("Model identifier cannot be empty".to_string());
        }
        if self.model.temperature > 1.5 {
            result.add_warning(
                "Temperature is very high (>1.5), structured outputs may not parse".to_string(),
            );
        }

        result
    }

    fn validate_strict(&self) -> ValidationResult {
        let mut result = self.validate();

        // Additional strict validations
        if !self.graph_store.uri.starts_with("bolt://")
            && !self.graph_store.uri.starts_with("neo4j://")
        {
            result.add_warning(format!(
                "Graph store uri has an unusual scheme: {}",
                self.graph_store.uri
            ));
        }

        if self.retrieval.timeout_secs > 120 {
            result.add_suggestion(
                "Consider a timeout under 120s so degraded queries return promptly".to_string(),
            );
        }

        if self.retrieval.top_k * 2 > self.retrieval.max_nodes {
            result.add_suggestion(
                "max_nodes should comfortably exceed 2x top_k so truncation happens after ranking"
                    .to_string(),
            );
        }

        result
    }
}

/// Validate a configuration file without fully loading the system
pub fn validate_config_file(path: &str) -> Result<ValidationResult> {
    if !Path::new(path).exists() {
        return Err(TourRagError::Config {
            message: format!("Config file not found: {path}"),
        });
    }
    let config = Config::from_file(path)?;
    Ok(config.validate())
}
