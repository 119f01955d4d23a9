//! Shared test utilities for `toponym-core`.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    SuffixTrie,
    error::RecordSourceError,
    record::{CityRecord, RecordSource},
};

/// [`RecordSource`] implementation that records lookups for tests.
#[derive(Clone)]
pub(crate) struct CountingSource {
    records: Vec<CityRecord>,
    calls: Arc<AtomicUsize>,
    name: &'static str,
}

impl CountingSource {
    /// Creates a source whose records carry synthetic coordinates derived
    /// from their position.
    #[must_use]
    pub(crate) fn from_names(names: &[&str]) -> Self {
        Self {
            records: records_from_names(names),
            calls: Arc::new(AtomicUsize::new(0)),
            name: "counting",
        }
    }

    /// Returns the backing lookup counter for assertions.
    #[must_use]
    pub(crate) fn calls(&self) -> &Arc<AtomicUsize> {
        &self.calls
    }
}

impl RecordSource for CountingSource {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.records
            .get(index)
            .ok_or(RecordSourceError::OutOfBounds { index })
    }
}

/// Places record `i` at `(i, 2i)` so every pair of records is distinct.
#[must_use]
pub(crate) fn records_from_names(names: &[&str]) -> Vec<CityRecord> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let offset = index as f64;
            CityRecord::new(*name, offset, offset * 2.0)
        })
        .collect()
}

/// Builds a trie over `names`, panicking on malformed input.
#[must_use]
pub(crate) fn trie_from_names(names: &[&str]) -> SuffixTrie {
    SuffixTrie::from_records(records_from_names(names)).expect("test names must be non-empty")
}
