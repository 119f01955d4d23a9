//! Toponym core library.
//!
//! Builds a shared-ending trie over place names, counts how many records
//! every suffix subsumes, derives a character n-gram model, selects suffix
//! clusters and measures their geographic spread.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod aggregate;
mod clustering;
mod error;
mod geo;
mod ngram;
mod record;
mod result;
mod trie;

#[cfg(test)]
mod test_utils;

pub use crate::{
    aggregate::{AggregationReport, CountState, SubsumedCounts},
    clustering::{
        ClusterFlags, ClusterSizeBounds, FlagState, MIN_CLUSTER_FLOOR, SelectionStrategy,
        Significance, SignificanceWeights, SuffixClustering, SuffixClusteringBuilder,
        WEIGHT_SUM_TOLERANCE,
    },
    error::{
        ClusteringError, ClusteringErrorCode, ConfigError, ConfigErrorCode, GeoError,
        GeoErrorCode, NGramError, NGramErrorCode, RecordSourceError, RecordSourceErrorCode,
        TrieError, TrieErrorCode,
    },
    geo::{GeoEvaluator, GeoStatistics, euclidean},
    ngram::{END_SENTINEL, NGramKind, NGramModel, START_SENTINEL},
    record::{CityRecord, RecordId, RecordSource},
    result::ClusterSet,
    trie::{BranchingClass, BranchingSummary, NodeId, SuffixNode, SuffixTrie, TrieSummary},
};
