//! Cluster candidate selection over a counted suffix trie.
//!
//! Both strategies walk every root's tree breadth-first. A child is only
//! descended into when it subsumes at least the tree's minimum cluster
//! size, and only children inside [`ClusterSizeBounds`] can become
//! candidates.

mod builder;
mod flags;
mod proportion;
mod significance;

use crate::{
    aggregate::SubsumedCounts, error::ClusteringError, ngram::NGramModel, result::ClusterSet,
    trie::SuffixTrie,
};

pub use self::{
    builder::{SelectionStrategy, SignificanceWeights, SuffixClusteringBuilder, WEIGHT_SUM_TOLERANCE},
    flags::{ClusterFlags, FlagState},
    significance::Significance,
};

/// Smallest cluster any tree admits.
pub const MIN_CLUSTER_FLOOR: i64 = 5;

/// Admissible cluster sizes for one tree.
///
/// Bounds are signed: a tree with fewer than three records has a negative
/// maximum and admits no cluster at all.
///
/// # Examples
/// ```
/// use toponym_core::ClusterSizeBounds;
///
/// let bounds = ClusterSizeBounds::for_root(200, 0.05, 0.05);
/// assert_eq!((bounds.min(), bounds.max()), (10, 190));
///
/// let tiny = ClusterSizeBounds::for_root(2, 0.05, 0.05);
/// assert_eq!((tiny.min(), tiny.max()), (5, 0));
/// assert!(!tiny.contains(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSizeBounds {
    min: i64,
    max: i64,
}

impl ClusterSizeBounds {
    /// Derives the bounds for a tree whose root subsumes `records` records.
    ///
    /// `min = max(5, round(records * min_percent))` and
    /// `max = min(records - 2, round(records * (1 - max_percent)))`.
    #[must_use]
    pub fn for_root(records: u64, min_percent: f64, max_percent: f64) -> Self {
        let total = records as f64;
        let records = i64::try_from(records).unwrap_or(i64::MAX);
        Self {
            min: MIN_CLUSTER_FLOOR.max((total * min_percent).round() as i64),
            max: (records - 2).min((total * (1.0 - max_percent)).round() as i64),
        }
    }

    /// Smallest admissible cluster size.
    #[rustfmt::skip]
    #[must_use]
    pub const fn min(&self) -> i64 { self.min }

    /// Largest admissible cluster size.
    #[rustfmt::skip]
    #[must_use]
    pub const fn max(&self) -> i64 { self.max }

    /// Returns whether a node subsuming `count` records is worth descending
    /// into.
    #[must_use]
    pub fn admits(&self, count: u64) -> bool {
        i64::try_from(count).is_ok_and(|count| count >= self.min)
    }

    /// Returns whether `count` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, count: u64) -> bool {
        i64::try_from(count).is_ok_and(|count| (self.min..=self.max).contains(&count))
    }
}

/// Validated cluster selection parameters.
///
/// Construct through [`SuffixClusteringBuilder`].
#[derive(Debug, Clone)]
pub struct SuffixClustering {
    proportion: f64,
    min_percent: f64,
    max_percent: f64,
    weights: SignificanceWeights,
    alpha: f64,
    strategy: SelectionStrategy,
}

impl SuffixClustering {
    pub(crate) fn new(
        proportion: f64,
        min_percent: f64,
        max_percent: f64,
        weights: SignificanceWeights,
        alpha: f64,
        strategy: SelectionStrategy,
    ) -> Self {
        Self {
            proportion,
            min_percent,
            max_percent,
            weights,
            alpha,
            strategy,
        }
    }

    /// Returns the share a child must hold under the proportion strategy.
    #[rustfmt::skip]
    #[must_use]
    pub fn proportion(&self) -> f64 { self.proportion }

    /// Returns the lower size fraction.
    #[rustfmt::skip]
    #[must_use]
    pub fn min_percent(&self) -> f64 { self.min_percent }

    /// Returns the upper size fraction.
    #[rustfmt::skip]
    #[must_use]
    pub fn max_percent(&self) -> f64 { self.max_percent }

    /// Returns the significance interpolation weights.
    #[rustfmt::skip]
    #[must_use]
    pub fn weights(&self) -> SignificanceWeights { self.weights }

    /// Returns the significance factor.
    #[rustfmt::skip]
    #[must_use]
    pub fn alpha(&self) -> f64 { self.alpha }

    /// Returns the configured strategy.
    #[rustfmt::skip]
    #[must_use]
    pub fn strategy(&self) -> SelectionStrategy { self.strategy }

    /// Returns the size bounds for a tree whose root subsumes `records`.
    #[must_use]
    pub fn bounds_for(&self, records: u64) -> ClusterSizeBounds {
        ClusterSizeBounds::for_root(records, self.min_percent, self.max_percent)
    }

    /// Runs the configured strategy and returns the selected candidates.
    ///
    /// # Errors
    /// Propagates the errors of [`Self::by_proportion`] or
    /// [`Self::by_significance`].
    pub fn select(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
        model: &NGramModel,
    ) -> Result<ClusterSet, ClusteringError> {
        match self.strategy {
            SelectionStrategy::Proportion => self.by_proportion(trie, counts),
            SelectionStrategy::Significance => {
                let mut flags = ClusterFlags::new(trie);
                self.by_significance(trie, counts, model, &mut flags)?;
                Ok(flags.candidates())
            }
        }
    }
}

#[cfg(test)]
mod tests;
