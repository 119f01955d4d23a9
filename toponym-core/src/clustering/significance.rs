//! Significance strategy: a child is a candidate when its share of the
//! parent's records beats what the n-gram model predicts for prepending its
//! first letter.

use std::collections::VecDeque;

use tracing::{debug, instrument, trace};

use crate::{
    aggregate::SubsumedCounts,
    error::{ClusteringError, NGramError},
    ngram::{END_SENTINEL, NGramModel},
    trie::{NodeId, SuffixTrie},
};

use super::{ClusterFlags, SignificanceWeights, SuffixClustering};

const PHASE: &str = "significance selection";

/// Observed share of a child against the model's interpolated expectation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    actual: f64,
    expected: f64,
}

impl Significance {
    /// Share of the parent's records the child subsumes.
    #[rustfmt::skip]
    #[must_use]
    pub fn actual(&self) -> f64 { self.actual }

    /// Interpolated probability of the child's first letter given the
    /// letters that follow it.
    #[rustfmt::skip]
    #[must_use]
    pub fn expected(&self) -> f64 { self.expected }

    /// Returns `actual / expected`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.actual / self.expected
    }

    /// Returns whether `actual > alpha * expected`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.actual > alpha * self.expected
    }
}

/// The n-grams one significance test looks up, padded with the end
/// sentinel where the suffix is too short.
#[derive(Debug, PartialEq, Eq)]
struct Contexts {
    letter: char,
    following: char,
    bigram: String,
    following_pair: String,
    trigram: String,
}

impl Contexts {
    fn of(suffix: &str) -> Option<Self> {
        let mut chars = suffix.chars();
        let letter = chars.next()?;
        let second = chars.next();
        let third = chars.next();

        let following = second.unwrap_or(END_SENTINEL);
        let bigram = String::from_iter([letter, following]);
        let (trigram, following_pair) = match (second, third) {
            (Some(second), Some(third)) => (
                String::from_iter([letter, second, third]),
                String::from_iter([second, third]),
            ),
            _ => (
                format!("{bigram}{END_SENTINEL}"),
                String::from_iter([following, END_SENTINEL]),
            ),
        };
        Some(Self {
            letter,
            following,
            bigram,
            following_pair,
            trigram,
        })
    }

    fn expected(&self, model: &NGramModel, weights: SignificanceWeights) -> Result<f64, NGramError> {
        let p0 = model.letter_probability(self.letter)?;
        let p1 = model.bigram_probability(&self.bigram)? / model.letter_probability(self.following)?;
        let p2 = model.trigram_probability(&self.trigram)?
            / model.bigram_probability(&self.following_pair)?;
        Ok(weights.letter * p0 + weights.bigram * p1 + weights.trigram * p2)
    }
}

impl SuffixClustering {
    /// Tests `child` against its `parent`.
    ///
    /// With `s` the child's suffix, the expectation interpolates `P(s0)`,
    /// `P(s0 s1) / P(s1)` and `P(s0 s1 s2) / P(s1 s2)`; missing positions
    /// are filled with the end sentinel.
    ///
    /// # Errors
    /// Returns [`ClusteringError::PreconditionNotMet`] when either count is
    /// missing and [`ClusteringError::NGram`] when the model lacks one of the
    /// n-grams.
    pub fn significance(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
        model: &NGramModel,
        parent: NodeId,
        child: NodeId,
    ) -> Result<Significance, ClusteringError> {
        let parent_count = counts.require(trie, parent, PHASE)?;
        let child_count = counts.require(trie, child, PHASE)?;
        let suffix = trie.value(child);
        let contexts = Contexts::of(suffix).ok_or(ClusteringError::UnknownNode { node: child })?;
        let expected = contexts
            .expected(model, self.weights)
            .map_err(|source| ClusteringError::NGram {
                suffix: suffix.into(),
                source,
            })?;

        Ok(Significance {
            actual: child_count as f64 / parent_count as f64,
            expected,
        })
    }

    /// Flags candidates by significance.
    ///
    /// For every parent, children within the tree's size bounds are tested.
    /// Significant children are flagged only when at least one tested
    /// sibling is not significant; when every tested sibling is significant,
    /// none is flagged.
    ///
    /// # Errors
    /// Returns [`ClusteringError::PreconditionNotMet`] when `counts` lacks a
    /// visited node and [`ClusteringError::NGram`] when the model lacks an
    /// n-gram needed by a test.
    #[instrument(
        name = "clustering.by_significance",
        err,
        skip(self, trie, counts, model, flags),
        fields(
            roots = trie.roots().len(),
            alpha = self.alpha,
            candidates = tracing::field::Empty,
        ),
    )]
    pub fn by_significance(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
        model: &NGramModel,
        flags: &mut ClusterFlags,
    ) -> Result<(), ClusteringError> {
        let mut flagged = 0_usize;
        for &root in trie.roots() {
            flagged += self.test_tree(trie, counts, model, root, flags)?;
        }
        tracing::Span::current().record("candidates", flagged);
        Ok(())
    }

    fn test_tree(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
        model: &NGramModel,
        root: NodeId,
        flags: &mut ClusterFlags,
    ) -> Result<usize, ClusteringError> {
        let bounds = self.bounds_for(counts.require(trie, root, PHASE)?);
        debug!(
            root = trie.value(root),
            min = bounds.min(),
            max = bounds.max(),
            "testing tree"
        );

        let mut flagged = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(parent) = queue.pop_front() {
            let mut inheritance = true;
            let mut significant = Vec::new();
            for &child in trie.children(parent) {
                let count = counts.require(trie, child, PHASE)?;
                if !bounds.admits(count) {
                    continue;
                }
                queue.push_back(child);
                if !bounds.contains(count) {
                    continue;
                }
                let test = self.significance(trie, counts, model, parent, child)?;
                let is_significant = test.is_significant(self.alpha);
                trace!(
                    suffix = trie.value(child),
                    actual = test.actual(),
                    expected = test.expected(),
                    significant = is_significant,
                    "significance tested"
                );
                inheritance &= is_significant;
                if is_significant {
                    significant.push(child);
                }
            }
            if !inheritance && !significant.is_empty() {
                flagged += significant.len();
                for child in significant {
                    flags.flag(child);
                }
            }
        }
        Ok(flagged)
    }
}
