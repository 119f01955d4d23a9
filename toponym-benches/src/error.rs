//! Benchmark setup error type.

use toponym_core::{ClusteringError, ConfigError, TrieError};

use crate::source::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic corpus generation failed.
    #[error("synthetic corpus generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The trie could not be built from the corpus.
    #[error("trie construction failed: {0}")]
    Trie(#[from] TrieError),
    /// Selection parameters were rejected.
    #[error("invalid selection parameters: {0}")]
    Config(#[from] ConfigError),
    /// Cluster selection failed.
    #[error("cluster selection failed: {0}")]
    Clustering(#[from] ClusteringError),
}
