use std::{fmt, io};

use thiserror::Error;

/// Failures raised while reading a city file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CitySourceError {
    /// A row did not have the number of fields the layout requires.
    #[error("line {line} has {found} fields but {expected} are required")]
    FieldCount {
        /// One-based line number.
        line: usize,
        /// Fields found on the line.
        found: usize,
        /// Fields the layout requires.
        expected: usize,
    },
    /// A latitude or longitude field did not parse as a number.
    #[error("line {line} has an invalid {axis} `{value}`")]
    InvalidCoordinate {
        /// One-based line number.
        line: usize,
        /// Either `latitude` or `longitude`.
        axis: &'static str,
        /// The raw field.
        value: String,
    },
    /// The name field of a row was blank.
    #[error("line {line} has an empty city name")]
    EmptyName {
        /// One-based line number.
        line: usize,
    },
    /// No row survived the header and country filter.
    #[error("no city rows in input")]
    EmptyInput,
    /// Reading or writing a city file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl From<csv::Error> for CitySourceError {
    fn from(error: csv::Error) -> Self {
        match error.into_kind() {
            csv::ErrorKind::Io(source) => Self::Io(source),
            other => Self::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{other:?}"),
            )),
        }
    }
}

/// Stable machine-readable codes for [`CitySourceError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CitySourceErrorCode {
    /// See [`CitySourceError::FieldCount`].
    FieldCount,
    /// See [`CitySourceError::InvalidCoordinate`].
    InvalidCoordinate,
    /// See [`CitySourceError::EmptyName`].
    EmptyName,
    /// See [`CitySourceError::EmptyInput`].
    EmptyInput,
    /// See [`CitySourceError::Io`].
    Io,
}

impl CitySourceErrorCode {
    /// Return the stable machine-readable representation of this error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FieldCount => "CITY_SOURCE_FIELD_COUNT",
            Self::InvalidCoordinate => "CITY_SOURCE_INVALID_COORDINATE",
            Self::EmptyName => "CITY_SOURCE_EMPTY_NAME",
            Self::EmptyInput => "CITY_SOURCE_EMPTY_INPUT",
            Self::Io => "CITY_SOURCE_IO",
        }
    }
}

impl fmt::Display for CitySourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CitySourceError {
    /// Retrieve the stable [`CitySourceErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> CitySourceErrorCode {
        match self {
            Self::FieldCount { .. } => CitySourceErrorCode::FieldCount,
            Self::InvalidCoordinate { .. } => CitySourceErrorCode::InvalidCoordinate,
            Self::EmptyName { .. } => CitySourceErrorCode::EmptyName,
            Self::EmptyInput => CitySourceErrorCode::EmptyInput,
            Self::Io(_) => CitySourceErrorCode::Io,
        }
    }
}
