//! Benchmark support crate for toponym.
//!
//! Provides a seeded synthetic place-name corpus and parameter types used by
//! the Criterion benchmarks for trie construction, aggregation and cluster
//! selection.

pub mod error;
pub mod params;
pub mod source;
