//! Seeded synthetic place names built from random stems and common endings.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use thiserror::Error;
use toponym_core::{CityRecord, RecordSource, RecordSourceError};

const STEM_ALPHABET: &[char] = &[
    'a', 'b', 'd', 'e', 'g', 'h', 'i', 'k', 'l', 'm', 'n', 'o', 'r', 's', 't', 'u', 'w',
];

/// Endings appended to generated stems.
pub const ENDINGS: &[&str] = &[
    "dorf", "hausen", "ingen", "burg", "stadt", "feld", "heim", "bach", "au", "itz",
];

/// Configuration for synthetic corpus generation.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of names to generate.
    pub name_count: usize,
    /// Longest random stem.
    pub max_stem: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl SyntheticConfig {
    /// Creates a configuration with stems of up to five letters.
    #[must_use]
    pub const fn new(name_count: usize, seed: u64) -> Self {
        Self {
            name_count,
            max_stem: 5,
            seed,
        }
    }
}

/// Invalid synthetic corpus configurations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntheticError {
    /// No names were requested.
    #[error("name count must be positive")]
    ZeroNames,
    /// Stems must have at least one letter.
    #[error("stem length must be positive")]
    ZeroStem,
}

/// A generated corpus of places scattered over a German-sized box.
#[derive(Clone, Debug)]
pub struct SyntheticPlaces {
    records: Vec<CityRecord>,
}

impl SyntheticPlaces {
    /// Generates names of a random stem followed by one of [`ENDINGS`].
    ///
    /// # Errors
    /// Returns [`SyntheticError`] when the configuration is invalid.
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        if config.name_count == 0 {
            return Err(SyntheticError::ZeroNames);
        }
        if config.max_stem == 0 {
            return Err(SyntheticError::ZeroStem);
        }
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let records = (0..config.name_count)
            .map(|_| {
                let stem_length = rng.gen_range(1..=config.max_stem);
                let mut name: String = (0..stem_length)
                    .map(|_| STEM_ALPHABET[rng.gen_range(0..STEM_ALPHABET.len())])
                    .collect();
                name.push_str(ENDINGS[rng.gen_range(0..ENDINGS.len())]);
                CityRecord::new(name, rng.gen_range(47.0..55.0), rng.gen_range(6.0..15.0))
            })
            .collect();
        Ok(Self { records })
    }

    /// Returns the generated records.
    #[must_use]
    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }
}

impl RecordSource for SyntheticPlaces {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn name(&self) -> &str {
        "synthetic-places"
    }

    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
        self.records
            .get(index)
            .ok_or(RecordSourceError::OutOfBounds { index })
    }
}
