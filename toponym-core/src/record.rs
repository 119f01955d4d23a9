//! Corpus records and the source abstraction that yields them.

use std::fmt;

use crate::error::RecordSourceError;

/// A named place with its coordinates.
///
/// # Examples
/// ```
/// use toponym_core::CityRecord;
///
/// let leipzig = CityRecord::new("leipzig", 51.34, 12.37);
/// assert_eq!(leipzig.name(), "leipzig");
/// assert_eq!(leipzig.coordinates(), (51.34, 12.37));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl CityRecord {
    /// Creates a record from a name and a `(latitude, longitude)` pair.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Returns the place name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the latitude in degrees.
    #[rustfmt::skip]
    #[must_use]
    pub fn latitude(&self) -> f64 { self.latitude }

    /// Returns the longitude in degrees.
    #[rustfmt::skip]
    #[must_use]
    pub fn longitude(&self) -> f64 { self.longitude }

    /// Returns `(latitude, longitude)`.
    #[must_use]
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Identifier assigned to a record when it is inserted into a
/// [`crate::SuffixTrie`]. Identifiers follow insertion order.
///
/// # Examples
/// ```
/// use toponym_core::RecordId;
///
/// let id = RecordId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

impl RecordId {
    /// Creates a record identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn new(id: usize) -> Self { Self(id) }

    /// Returns the underlying index.
    #[rustfmt::skip]
    #[must_use]
    pub fn get(self) -> usize { self.0 }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Abstraction over an ordered collection of corpus records.
///
/// # Examples
/// ```
/// use toponym_core::{CityRecord, RecordSource, RecordSourceError};
///
/// struct Fixed(Vec<CityRecord>);
///
/// impl RecordSource for Fixed {
///     fn len(&self) -> usize { self.0.len() }
///     fn name(&self) -> &str { "fixed" }
///     fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
///         self.0.get(index).ok_or(RecordSourceError::OutOfBounds { index })
///     }
/// }
///
/// let source = Fixed(vec![CityRecord::new("pelzig", 51.0, 12.0)]);
/// assert_eq!(source.len(), 1);
/// assert_eq!(source.record(0)?.name(), "pelzig");
/// assert!(source.record(1).is_err());
/// # Ok::<(), RecordSourceError>(())
/// ```
pub trait RecordSource {
    /// Returns the number of records in the source.
    fn len(&self) -> usize;

    /// Returns whether the source contains no records.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Returns the record at `index`.
    ///
    /// # Errors
    /// Implementations must return [`RecordSourceError::OutOfBounds`] for
    /// indices at or beyond [`Self::len`].
    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError>;
}
