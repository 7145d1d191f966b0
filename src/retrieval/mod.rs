//! Dual-level and hybrid retrieval engines
//!
//! Retrieval runs at two granularities over the key-value index: the
//! entity level resolves concrete named things, the topic level resolves
//! thematic keywords through relations and categories. The hybrid engine
//! layers a dense vector search on top and interleaves both sources
//! round-robin into one ranked list.
//!
//! - [`keywords`] — LLM keyword extraction with a positional fallback
//! - [`dual_level`] — entity- and topic-level retrieval with scored
//!   tiers and graph-store supplements
//! - [`hybrid`] — graph-enhanced vector search and the round-robin merge

pub mod dual_level;
pub mod hybrid;
pub mod keywords;

pub use dual_level::DualLevelEngine;
pub use hybrid::HybridEngine;
pub use keywords::KeywordExtractor;
