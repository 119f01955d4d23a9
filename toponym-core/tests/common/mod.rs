use toponym_core::{CityRecord, RecordSource, RecordSourceError};

#[derive(Clone)]
pub struct Places {
    records: Vec<CityRecord>,
}

impl Places {
    #[must_use]
    pub fn new(records: Vec<CityRecord>) -> Self {
        Self { records }
    }

    /// Places `names` on a line, one degree of latitude apart.
    #[must_use]
    pub fn on_a_line(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(index, name)| CityRecord::new(*name, index as f64, 0.0))
                .collect(),
        )
    }
}

impl RecordSource for Places {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn name(&self) -> &str {
        "places"
    }

    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
        self.records
            .get(index)
            .ok_or(RecordSourceError::OutOfBounds { index })
    }
}

/// Claims more records than it holds.
pub struct Truncated {
    inner: Places,
    claimed: usize,
}

impl Truncated {
    #[must_use]
    pub fn new(inner: Places, claimed: usize) -> Self {
        Self { inner, claimed }
    }
}

impl RecordSource for Truncated {
    fn len(&self) -> usize {
        self.claimed
    }

    fn name(&self) -> &str {
        "truncated"
    }

    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
        self.inner.record(index)
    }
}
