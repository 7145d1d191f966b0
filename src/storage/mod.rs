//! Storage adapters for the retrieval core
//!
//! The engines only consume the read traits in [`crate::core::traits`];
//! this module provides the in-memory implementations used as defaults
//! in development and as fixtures in tests.
//!
//! ## Backends
//!
//! - [`MemoryGraphStore`] — petgraph-backed property graph
//! - [`MemoryVectorStore`] — brute-force cosine index over deterministic
//!   embeddings

pub mod memory;

pub use memory::{MemoryGraphStore, MemoryVectorStore};
