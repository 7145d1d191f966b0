//! Query routing between the retrieval pipelines
//!
//! - [`router`] — lexical strategy analysis and the [`QueryRouter`]
//!   dispatching each query to graph, hybrid, or both

pub mod router;

pub use router::{analyze_query, QueryAnalysis, QueryRouter, RetrievalStrategy};
