//! Proportion strategy: a child is a candidate when it keeps a large enough
//! share of its parent's records.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, instrument};

use crate::{
    aggregate::SubsumedCounts,
    error::ClusteringError,
    result::ClusterSet,
    trie::{NodeId, SuffixTrie},
};

use super::SuffixClustering;

const PHASE: &str = "proportion selection";

impl SuffixClustering {
    /// Selects candidates by proportion.
    ///
    /// For a parent subsuming `C` records every admitted child subsuming `c`
    /// records is queued; it becomes a candidate when `c` is within the
    /// tree's size bounds and `c >= C * proportion`. Marking a child removes
    /// every marked ancestor, so the result never nests.
    ///
    /// # Errors
    /// Returns [`ClusteringError::PreconditionNotMet`] when `counts` lacks a
    /// visited node.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::{CityRecord, SubsumedCounts, SuffixClusteringBuilder, SuffixTrie};
    ///
    /// let trie = SuffixTrie::from_records([
    ///     CityRecord::new("leipzig", 51.34, 12.37),
    ///     CityRecord::new("pelzig", 51.10, 12.10),
    /// ])?;
    /// let counts = SubsumedCounts::compute(&trie);
    /// let clustering = SuffixClusteringBuilder::new().build()?;
    /// assert!(clustering.by_proportion(&trie, &counts)?.is_empty());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[instrument(
        name = "clustering.by_proportion",
        err,
        skip(self, trie, counts),
        fields(
            roots = trie.roots().len(),
            proportion = self.proportion,
            candidates = tracing::field::Empty,
        ),
    )]
    pub fn by_proportion(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
    ) -> Result<ClusterSet, ClusteringError> {
        let mut marked = BTreeSet::new();
        for &root in trie.roots() {
            self.walk_tree(trie, counts, root, &mut marked)?;
        }
        let candidates = ClusterSet::from_iter(marked);
        tracing::Span::current().record("candidates", candidates.len());
        Ok(candidates)
    }

    fn walk_tree(
        &self,
        trie: &SuffixTrie,
        counts: &SubsumedCounts,
        root: NodeId,
        marked: &mut BTreeSet<NodeId>,
    ) -> Result<(), ClusteringError> {
        let bounds = self.bounds_for(counts.require(trie, root, PHASE)?);
        debug!(
            root = trie.value(root),
            min = bounds.min(),
            max = bounds.max(),
            "walking tree"
        );

        let mut queue = VecDeque::from([root]);
        while let Some(parent) = queue.pop_front() {
            let expected = counts.require(trie, parent, PHASE)? as f64 * self.proportion;
            for &child in trie.children(parent) {
                let count = counts.require(trie, child, PHASE)?;
                if !bounds.admits(count) {
                    continue;
                }
                queue.push_back(child);
                if bounds.contains(count) && count as f64 >= expected {
                    marked.insert(child);
                    unmark_ancestors(trie, parent, marked);
                }
            }
        }
        Ok(())
    }
}

fn unmark_ancestors(trie: &SuffixTrie, from: NodeId, marked: &mut BTreeSet<NodeId>) {
    let mut current = Some(from);
    while let Some(id) = current {
        marked.remove(&id);
        current = trie.parent(id);
    }
}
