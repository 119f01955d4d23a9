//! City record source for comma-separated place-name files.

mod errors;
mod source;

pub use errors::{CitySourceError, CitySourceErrorCode};
pub use source::{CityLayout, CitySource, EXTRACTED_HEADER};
