//! Error types for the toponym core library.
//!
//! Each pipeline phase owns one error enum. Every enum carries a stable,
//! machine-readable code so the CLI can log failures without matching on
//! display strings.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{ngram::NGramKind, trie::NodeId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::RecordSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RecordSourceError {
    /// Requested record index was outside the source's bounds.
    #[error("record {index} is out of bounds")]
    OutOfBounds {
        /// The requested record index.
        index: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`RecordSourceError`] variants.
    enum RecordSourceErrorCode for RecordSourceError {
        /// Requested record index was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "RECORD_SOURCE_OUT_OF_BOUNDS",
    }
}

/// Errors raised while building a [`crate::SuffixTrie`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TrieError {
    /// A record carried an empty name.
    #[error("record {record} has an empty name")]
    EmptyName {
        /// Index the record would have received.
        record: usize,
    },
    /// The supplied [`crate::RecordSource`] contained no records.
    #[error("record source `{data_source}` contains no records")]
    EmptySource {
        /// Identifier for the empty source.
        data_source: Arc<str>,
    },
    /// A [`crate::RecordSource`] operation failed while building the trie.
    #[error("record source `{data_source}` failed: {error}")]
    RecordSource {
        /// Identifier for the failing source.
        data_source: Arc<str>,
        /// Underlying source error.
        #[source]
        error: RecordSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`TrieError`] variants.
    enum TrieErrorCode for TrieError {
        /// A record carried an empty name.
        EmptyName => EmptyName { .. } => "TRIE_EMPTY_NAME",
        /// The supplied record source contained no records.
        EmptySource => EmptySource { .. } => "TRIE_EMPTY_SOURCE",
        /// A record source operation failed while building the trie.
        RecordSourceFailure => RecordSource { .. } => "TRIE_RECORD_SOURCE_FAILURE",
    }
}

impl TrieError {
    /// Retrieve the inner [`RecordSourceErrorCode`] when the error originated in a
    /// [`crate::RecordSource`].
    pub const fn record_source_code(&self) -> Option<RecordSourceErrorCode> {
        match self {
            Self::RecordSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }
}

/// Errors raised by [`crate::NGramModel`] lookups.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NGramError {
    /// The n-gram never occurred in the corpus the model was built from.
    #[error("{kind} `{gram}` does not occur in the corpus")]
    Unknown {
        /// Which table was queried.
        kind: NGramKind,
        /// The queried n-gram.
        gram: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`NGramError`] variants.
    enum NGramErrorCode for NGramError {
        /// The n-gram never occurred in the corpus.
        Unknown => Unknown { .. } => "NGRAM_UNKNOWN",
    }
}

/// Errors raised when validating a [`crate::SuffixClusteringBuilder`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A proportion-like parameter fell outside `[0, 1]`.
    #[error("{parameter} must lie within [0, 1] (got {value})")]
    OutOfRange {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A significance weight was negative or not finite.
    #[error("significance weight {parameter} must be finite and non-negative (got {value})")]
    InvalidWeight {
        /// Name of the offending weight.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The significance weights do not sum to one.
    #[error("significance weights must sum to 1 (got {sum})")]
    WeightSum {
        /// Sum of the supplied weights.
        sum: f64,
    },
    /// The significance factor must be positive and finite.
    #[error("alpha must be positive and finite (got {alpha})")]
    InvalidAlpha {
        /// The rejected factor.
        alpha: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConfigError`] variants.
    enum ConfigErrorCode for ConfigError {
        /// A proportion-like parameter fell outside `[0, 1]`.
        OutOfRange => OutOfRange { .. } => "CONFIG_OUT_OF_RANGE",
        /// A significance weight was negative or not finite.
        InvalidWeight => InvalidWeight { .. } => "CONFIG_INVALID_WEIGHT",
        /// The significance weights do not sum to one.
        WeightSum => WeightSum { .. } => "CONFIG_WEIGHT_SUM",
        /// The significance factor must be positive and finite.
        InvalidAlpha => InvalidAlpha { .. } => "CONFIG_INVALID_ALPHA",
    }
}

/// Errors raised while selecting cluster candidates.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ClusteringError {
    /// Subsumed counts were not available for a node the traversal reached.
    #[error("subsumed count missing for `{suffix}` during {phase}; run the aggregator first")]
    PreconditionNotMet {
        /// Suffix of the node lacking a count.
        suffix: Arc<str>,
        /// Phase that required the count.
        phase: &'static str,
    },
    /// The significance test queried an n-gram absent from the model.
    #[error("significance test for `{suffix}` failed: {source}")]
    NGram {
        /// Suffix under test.
        suffix: Arc<str>,
        /// Underlying lookup failure.
        #[source]
        source: NGramError,
    },
    /// A node identifier did not belong to the trie.
    #[error("node {node} does not belong to this trie")]
    UnknownNode {
        /// The foreign identifier.
        node: NodeId,
    },
}

define_error_codes! {
    /// Stable codes describing [`ClusteringError`] variants.
    enum ClusteringErrorCode for ClusteringError {
        /// Subsumed counts were not available.
        PreconditionNotMet => PreconditionNotMet { .. } => "CLUSTERING_PRECONDITION_NOT_MET",
        /// The significance test queried an unknown n-gram.
        UnknownNGram => NGram { .. } => "CLUSTERING_UNKNOWN_NGRAM",
        /// A node identifier did not belong to the trie.
        UnknownNode => UnknownNode { .. } => "CLUSTERING_UNKNOWN_NODE",
    }
}

impl ClusteringError {
    /// Retrieve the inner [`NGramErrorCode`] when the failure came from the
    /// language model.
    pub const fn ngram_code(&self) -> Option<NGramErrorCode> {
        match self {
            Self::NGram { source, .. } => Some(source.code()),
            _ => None,
        }
    }
}

/// Errors raised by the [`crate::GeoEvaluator`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GeoError {
    /// Fewer than two records sit under the node, so no pairwise distance exists.
    #[error("`{suffix}` subsumes {records} record(s); at least two are needed")]
    InsufficientData {
        /// Suffix of the node.
        suffix: Arc<str>,
        /// Number of distinct records found.
        records: usize,
    },
    /// A node identifier did not belong to the trie.
    #[error("node {node} does not belong to this trie")]
    UnknownNode {
        /// The foreign identifier.
        node: NodeId,
    },
}

define_error_codes! {
    /// Stable codes describing [`GeoError`] variants.
    enum GeoErrorCode for GeoError {
        /// Fewer than two records sit under the node.
        InsufficientData => InsufficientData { .. } => "GEO_INSUFFICIENT_DATA",
        /// A node identifier did not belong to the trie.
        UnknownNode => UnknownNode { .. } => "GEO_UNKNOWN_NODE",
    }
}
