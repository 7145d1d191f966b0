//! Unified error handling for the TourRAG retrieval core
//!
//! This module provides a centralized error type that encompasses all possible
//! errors that can occur throughout the retrieval pipeline.

use std::fmt;

/// Main error type for the TourRAG system
#[derive(Debug)]
pub enum TourRagError {
    /// Configuration-related errors
    Config {
        /// Error message
        message: String,
    },

    /// Key-value index construction and lookup errors
    Index {
        /// Error message
        message: String,
    },

    /// Graph store query errors
    GraphStore {
        /// Error message
        message: String,
    },

    /// Vector store query errors
    VectorStore {
        /// Error message
        message: String,
    },

    /// Language model invocation errors
    LanguageModel {
        /// Error message
        message: String,
    },

    /// Retrieval pipeline errors
    Retrieval {
        /// Error message
        message: String,
    },

    /// Validation errors
    Validation {
        /// Error message
        message: String,
    },

    /// I/O errors from file operations
    Io(std::io::Error),

    /// Serde JSON errors
    SerdeJson(serde_json::Error),

    /// Resource not found errors
    NotFound {
        /// Resource type
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Operation timeout errors
    Timeout {
        /// Operation name
        operation: String,
        /// Timeout duration
        duration: std::time::Duration,
    },
}

impl fmt::Display for TourRagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourRagError::Config { message } => {
                write!(
                    f,
                    "Configuration error: {message}. \
                          Solution: Check your config file or start from Config::default()"
                )
            },
            TourRagError::Index { message } => {
                write!(
                    f,
                    "Index error: {message}. \
                          Solution: Rebuild the key-value index with IndexBuilder::build()"
                )
            },
            TourRagError::GraphStore { message } => {
                write!(
                    f,
                    "Graph store error: {message}. \
                          Solution: Check the graph store connection descriptor and that the store is reachable"
                )
            },
            TourRagError::VectorStore { message } => {
                write!(
                    f,
                    "Vector store error: {message}. \
                          Solution: Check the vector store collection name and dimension settings"
                )
            },
            TourRagError::LanguageModel { message } => {
                write!(
                    f,
                    "Language model error: {message}. \
                          Solution: Verify the model identifier and that the completion endpoint responds"
                )
            },
            TourRagError::Retrieval { message } => {
                write!(
                    f,
                    "Retrieval error: {message}. \
                          Solution: Ensure the index is built before serving queries"
                )
            },
            TourRagError::Validation { message } => {
                write!(f, "Validation error: {message}")
            },
            TourRagError::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}. \
                          Solution: Check file permissions and that paths exist"
                )
            },
            TourRagError::SerdeJson(err) => {
                write!(
                    f,
                    "JSON serialization error: {err}. \
                          Solution: Verify data structure compatibility"
                )
            },
            TourRagError::NotFound { resource, id } => {
                write!(f, "{resource} not found: {id}")
            },
            TourRagError::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Operation '{operation}' timed out after {duration:?}")
            },
        }
    }
}

impl std::error::Error for TourRagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TourRagError::Io(err) => Some(err),
            TourRagError::SerdeJson(err) => Some(err),
            _ => None,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for TourRagError {
    fn from(err: std::io::Error) -> Self {
        TourRagError::Io(err)
    }
}

impl From<serde_json::Error> for TourRagError {
    fn from(err: serde_json::Error) -> Self {
        TourRagError::SerdeJson(err)
    }
}

impl From<regex::Error> for TourRagError {
    fn from(err: regex::Error) -> Self {
        TourRagError::Validation {
            message: format!("Regex error: {err}"),
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, TourRagError>;

/// Trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context(self, context: &str) -> Result<T>;

    /// Add context using a closure
    fn with_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<TourRagError>,
{
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            match base_error {
                TourRagError::Config { message } => TourRagError::Config {
                    message: format!("{context}: {message}"),
                },
                TourRagError::Index { message } => TourRagError::Index {
                    message: format!("{context}: {message}"),
                },
                TourRagError::GraphStore { message } => TourRagError::GraphStore {
                    message: format!("{context}: {message}"),
                },
                TourRagError::VectorStore { message } => TourRagError::VectorStore {
                    message: format!("{context}: {message}"),
                },
                TourRagError::LanguageModel { message } => TourRagError::LanguageModel {
                    message: format!("{context}: {message}"),
                },
                TourRagError::Retrieval { message } => TourRagError::Retrieval {
                    message: format!("{context}: {message}"),
                },
                TourRagError::Validation { message } => TourRagError::Validation {
                    message: format!("{context}: {message}"),
                },
                other => other, // For errors that don't have a message field
            }
        })
    }

    fn with_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        match self {
            Ok(value) => Ok(value),
            Err(e) => {
                let context = f();
                Err(e).with_context(&context)
            },
        }
    }
}

/// Helper macros for creating specific error types
///
/// Creates a configuration error with a message
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::TourRagError::Config {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::TourRagError::Config {
            message: format!($fmt, $($arg)*),
        }
    };
}

/// Creates an index error with a message
#[macro_export]
macro_rules! index_error {
    ($msg:expr) => {
        $crate::TourRagError::Index {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::TourRagError::Index {
            message: format!($fmt, $($arg)*),
        }
    };
}

/// Creates a graph store error with a message
#[macro_export]
macro_rules! graph_store_error {
    ($msg:expr) => {
        $crate::TourRagError::GraphStore {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::TourRagError::GraphStore {
            message: format!($fmt, $($arg)*),
        }
    };
}

/// Creates a retrieval error with a message
#[macro_export]
macro_rules! retrieval_error {
    ($msg:expr) => {
        $crate::TourRagError::Retrieval {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::TourRagError::Retrieval {
            message: format!($fmt, $($arg)*),
        }
    };
}

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Informational - not actually an error
    Info,
    /// Warning - something unexpected but recoverable
    Warning,
    /// Error - operation failed but system can continue
    Error,
    /// Critical - system integrity compromised
    Critical,
}

impl TourRagError {
    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TourRagError::Config { .. } => ErrorSeverity::Critical,
            TourRagError::Index { .. } => ErrorSeverity::Error,
            TourRagError::GraphStore { .. } => ErrorSeverity::Warning,
            TourRagError::VectorStore { .. } => ErrorSeverity::Warning,
            TourRagError::LanguageModel { .. } => ErrorSeverity::Warning,
            TourRagError::Retrieval { .. } => ErrorSeverity::Warning,
            TourRagError::Validation { .. } => ErrorSeverity::Error,
            TourRagError::Io(_) => ErrorSeverity::Error,
            TourRagError::SerdeJson(_) => ErrorSeverity::Error,
            TourRagError::NotFound { .. } => ErrorSeverity::Warning,
            TourRagError::Timeout { .. } => ErrorSeverity::Warning,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => true,
            ErrorSeverity::Error => false,
            ErrorSeverity::Critical => false,
        }
    }

    /// Get error category for metrics/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            TourRagError::Config { .. } => "config",
            TourRagError::Index { .. } => "index",
            TourRagError::GraphStore { .. } => "graph_store",
            TourRagError::VectorStore { .. } => "vector_store",
            TourRagError::LanguageModel { .. } => "language_model",
            TourRagError::Retrieval { .. } => "retrieval",
            TourRagError::Validation { .. } => "validation",
            TourRagError::Io(_) => "io",
            TourRagError::SerdeJson(_) => "serialization",
            TourRagError::NotFound { .. } => "not_found",
            TourRagError::Timeout { .. } => "timeout",
        }
    }
}
