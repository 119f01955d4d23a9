//! Shared test utilities used across toponym crates.

pub mod corpus;
pub mod tracing;
