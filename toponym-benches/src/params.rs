//! Benchmark parameter types.

use std::fmt;

/// Parameters for a corpus-size benchmark run.
#[derive(Clone, Debug)]
pub struct CorpusBenchParams {
    /// Number of generated place names.
    pub name_count: usize,
}

impl fmt::Display for CorpusBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={}", self.name_count)
    }
}
