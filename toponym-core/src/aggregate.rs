//! Subsumed-city counts.
//!
//! `count(s)` is the number of corpus records whose name ends with `s`. The
//! aggregator fills counts bottom-up in rounds: the first frontier is the
//! set of name nodes, a node is counted once every out-neighbour is, and a
//! counted node hands its in-neighbour to the next frontier. Counts live in
//! [`SubsumedCounts`], separate from the trie, so a finished trie can be
//! borrowed immutably by every later phase.

use tracing::{debug, instrument};

use crate::{
    error::ClusteringError,
    trie::{NodeId, SuffixTrie},
};

/// Aggregation state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountState {
    /// Not every out-neighbour has been counted yet.
    #[default]
    Uncounted,
    /// Number of records subsumed by the node.
    Counted(u64),
}

impl CountState {
    /// Returns the count when available.
    #[must_use]
    pub const fn get(self) -> Option<u64> {
        match self {
            Self::Uncounted => None,
            Self::Counted(count) => Some(count),
        }
    }
}

/// Outcome of one [`SubsumedCounts::aggregate`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationReport {
    /// Frontier rounds processed.
    pub rounds: usize,
    /// Nodes that received a count during this pass.
    pub counted: usize,
    /// Frontier entries that were already counted.
    pub skipped: usize,
}

/// Per-node subsumed-city counts for one [`SuffixTrie`].
///
/// # Examples
/// ```
/// use toponym_core::{CityRecord, SubsumedCounts, SuffixTrie};
///
/// let trie = SuffixTrie::from_records([
///     CityRecord::new("leipzig", 51.34, 12.37),
///     CityRecord::new("pelzig", 51.10, 12.10),
/// ])?;
/// let counts = SubsumedCounts::compute(&trie);
/// let zig = trie.find("zig").expect("shared tail exists");
/// assert_eq!(counts.get(zig), Some(2));
/// # Ok::<(), toponym_core::TrieError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsumedCounts {
    states: Vec<CountState>,
}

impl SubsumedCounts {
    /// Creates a table with every node of `trie` uncounted.
    #[must_use]
    pub fn new(trie: &SuffixTrie) -> Self {
        Self {
            states: vec![CountState::Uncounted; trie.node_count()],
        }
    }

    /// Creates a table and aggregates it completely.
    #[must_use]
    pub fn compute(trie: &SuffixTrie) -> Self {
        let mut counts = Self::new(trie);
        counts.aggregate(trie);
        counts
    }

    /// Fills every missing count.
    ///
    /// Nodes already counted are skipped but still propagate their
    /// in-neighbour, so repeated passes are idempotent and a pass over a
    /// partially counted table completes it.
    #[instrument(
        name = "aggregate.run",
        skip(self, trie),
        fields(nodes = trie.node_count(), rounds = tracing::field::Empty),
    )]
    pub fn aggregate(&mut self, trie: &SuffixTrie) -> AggregationReport {
        self.grow_to(trie);
        let mut report = AggregationReport::default();
        let mut frontier: Vec<NodeId> = trie.name_nodes().collect();

        while !frontier.is_empty() {
            report.rounds += 1;
            let mut next = Vec::with_capacity(frontier.len());
            for id in frontier {
                if self.get(id).is_some() {
                    report.skipped += 1;
                    next.extend(trie.parent(id));
                    continue;
                }
                match self.count_from_children(trie, id) {
                    Some(count) => {
                        self.states[id.get()] = CountState::Counted(count);
                        report.counted += 1;
                        next.extend(trie.parent(id));
                    }
                    None => next.push(id),
                }
            }
            next.sort_unstable();
            next.dedup();
            debug!(round = report.rounds, frontier = next.len(), "aggregation round finished");
            frontier = next;
        }

        tracing::Span::current().record("rounds", report.rounds);
        report
    }

    /// Fills every missing count, processing disjoint root subtrees on the
    /// rayon pool and merging their counts on the calling thread.
    #[cfg(feature = "parallel")]
    #[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
    #[instrument(
        name = "aggregate.parallel",
        skip(self, trie),
        fields(nodes = trie.node_count(), roots = trie.roots().len()),
    )]
    pub fn aggregate_parallel(&mut self, trie: &SuffixTrie) -> AggregationReport {
        use rayon::prelude::*;

        self.grow_to(trie);
        let snapshot = &*self;
        let subtrees: Vec<Vec<(NodeId, u64)>> = trie
            .roots()
            .par_iter()
            .map(|&root| snapshot.count_subtree(trie, root))
            .collect();

        let mut report = AggregationReport {
            rounds: 1,
            ..AggregationReport::default()
        };
        for (id, count) in subtrees.into_iter().flatten() {
            let state = &mut self.states[id.get()];
            if *state == CountState::Uncounted {
                *state = CountState::Counted(count);
                report.counted += 1;
            } else {
                report.skipped += 1;
            }
        }
        debug!(counted = report.counted, "parallel aggregation merged");
        report
    }

    /// Counts one root's subtree in reverse pre-order, reusing counts that
    /// already exist.
    #[cfg(feature = "parallel")]
    fn count_subtree(&self, trie: &SuffixTrie, root: NodeId) -> Vec<(NodeId, u64)> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend_from_slice(trie.children(id));
        }

        let mut local: std::collections::HashMap<NodeId, u64> =
            std::collections::HashMap::with_capacity(order.len());
        for &id in order.iter().rev() {
            let count = self.get(id).unwrap_or_else(|| {
                let own = trie.node(id).map_or(0, |node| node.records().len() as u64);
                own + trie
                    .children(id)
                    .iter()
                    .map(|child| local.get(child).copied().unwrap_or(0))
                    .sum::<u64>()
            });
            local.insert(id, count);
        }
        order.into_iter().map(|id| (id, local[&id])).collect()
    }

    fn count_from_children(&self, trie: &SuffixTrie, id: NodeId) -> Option<u64> {
        let node = trie.node(id)?;
        let mut total = node.records().len() as u64;
        for &child in node.children() {
            total += self.get(child)?;
        }
        Some(total)
    }

    fn grow_to(&mut self, trie: &SuffixTrie) {
        if self.states.len() < trie.node_count() {
            self.states.resize(trie.node_count(), CountState::Uncounted);
        }
    }

    /// Returns the state of `id`, or `None` for identifiers outside the table.
    #[must_use]
    pub fn state(&self, id: NodeId) -> Option<CountState> {
        self.states.get(id.get()).copied()
    }

    /// Returns the count of `id` once it has been computed.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<u64> {
        self.state(id).and_then(CountState::get)
    }

    /// Returns the count of `id`, failing when aggregation has not reached it.
    ///
    /// # Errors
    /// Returns [`ClusteringError::UnknownNode`] when `id` does not belong to
    /// `trie` and [`ClusteringError::PreconditionNotMet`] when the count is
    /// missing.
    pub fn require(
        &self,
        trie: &SuffixTrie,
        id: NodeId,
        phase: &'static str,
    ) -> Result<u64, ClusteringError> {
        let node = trie.node(id).ok_or(ClusteringError::UnknownNode { node: id })?;
        self.get(id).ok_or_else(|| ClusteringError::PreconditionNotMet {
            suffix: node.value().into(),
            phase,
        })
    }

    /// Returns whether every node has been counted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.states
            .iter()
            .all(|state| matches!(state, CountState::Counted(_)))
    }

    /// Returns the number of counted nodes.
    #[must_use]
    pub fn counted(&self) -> usize {
        self.states
            .iter()
            .filter(|state| matches!(state, CountState::Counted(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::trie_from_names;
    use proptest::prelude::*;
    use rstest::rstest;

    fn count_of(trie: &SuffixTrie, counts: &SubsumedCounts, value: &str) -> Option<u64> {
        trie.find(value).and_then(|id| counts.get(id))
    }

    #[rstest]
    fn counts_records_under_each_tail() {
        let trie = trie_from_names(&["leipzig", "pelzig", "berlin"]);
        let counts = SubsumedCounts::compute(&trie);

        assert_eq!(count_of(&trie, &counts, "g"), Some(2));
        assert_eq!(count_of(&trie, &counts, "zig"), Some(2));
        assert_eq!(count_of(&trie, &counts, "lzig"), Some(1));
        assert_eq!(count_of(&trie, &counts, "n"), Some(1));
        assert!(counts.is_complete());
    }

    #[rstest]
    fn name_node_with_children_adds_its_own_records() {
        let trie = trie_from_names(&["au", "lau", "blau", "au"]);
        let counts = SubsumedCounts::compute(&trie);

        assert_eq!(count_of(&trie, &counts, "au"), Some(4));
        assert_eq!(count_of(&trie, &counts, "lau"), Some(2));
        assert_eq!(count_of(&trie, &counts, "u"), Some(4));
    }

    #[rstest]
    fn roots_conserve_the_record_total() {
        let trie = trie_from_names(&["leipzig", "pelzig", "berlin", "zwönitz", "bönitz", "hof"]);
        let counts = SubsumedCounts::compute(&trie);
        let total: u64 = trie
            .roots()
            .iter()
            .filter_map(|&root| counts.get(root))
            .sum();
        assert_eq!(total, trie.record_count() as u64);
    }

    #[rstest]
    fn second_pass_counts_nothing_new() {
        let trie = trie_from_names(&["leipzig", "pelzig"]);
        let mut counts = SubsumedCounts::new(&trie);
        let first = counts.aggregate(&trie);
        let snapshot = counts.clone();
        let second = counts.aggregate(&trie);

        assert_eq!(first.counted, trie.node_count());
        assert_eq!(second.counted, 0);
        assert!(second.skipped > 0);
        assert_eq!(counts, snapshot);
    }

    #[rstest]
    fn require_reports_missing_counts() {
        let trie = trie_from_names(&["leipzig"]);
        let counts = SubsumedCounts::new(&trie);
        let g = trie.find("g").expect("g must exist");

        let err = counts
            .require(&trie, g, "proportion selection")
            .expect_err("counts were never aggregated");
        assert_eq!(err.code().as_str(), "CLUSTERING_PRECONDITION_NOT_MET");
        assert!(err.to_string().contains("`g`"));
    }

    #[rstest]
    fn require_rejects_foreign_nodes() {
        let trie = trie_from_names(&["leipzig"]);
        let counts = SubsumedCounts::compute(&trie);
        let err = counts
            .require(&trie, NodeId::new(999), "test")
            .expect_err("node 999 does not exist");
        assert_eq!(err, ClusteringError::UnknownNode { node: NodeId::new(999) });
    }

    #[rstest]
    fn partial_table_is_completed() {
        let trie = trie_from_names(&["leipzig", "pelzig", "berlin"]);
        let full = SubsumedCounts::compute(&trie);
        let mut partial = full.clone();
        for value in ["g", "zig", "elzig"] {
            let id = trie.find(value).expect("tail must exist");
            partial.states[id.get()] = CountState::Uncounted;
        }
        assert!(!partial.is_complete());

        let report = partial.aggregate(&trie);
        assert_eq!(report.counted, 3);
        assert_eq!(partial, full);
    }

    #[cfg(feature = "parallel")]
    #[rstest]
    fn parallel_matches_sequential_on_fixture() {
        let trie = trie_from_names(&["leipzig", "pelzig", "berlin", "au", "lau", "blau"]);
        let sequential = SubsumedCounts::compute(&trie);
        let mut parallel = SubsumedCounts::new(&trie);
        let report = parallel.aggregate_parallel(&trie);

        assert_eq!(report.counted, trie.node_count());
        assert_eq!(parallel, sequential);
    }

    fn name_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]{1,6}", 1..40)
    }

    proptest! {
        #[test]
        fn sequential_counts_match_descent(names in name_strategy()) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let trie = trie_from_names(&refs);
            let counts = SubsumedCounts::compute(&trie);
            for (id, _) in trie.iter() {
                prop_assert_eq!(
                    counts.get(id),
                    Some(trie.subsumed_records(id).len() as u64)
                );
            }
        }

        #[cfg(feature = "parallel")]
        #[test]
        fn parallel_counts_match_sequential(names in name_strategy()) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let trie = trie_from_names(&refs);
            let sequential = SubsumedCounts::compute(&trie);
            let mut parallel = SubsumedCounts::new(&trie);
            parallel.aggregate_parallel(&trie);
            prop_assert_eq!(parallel, sequential);
        }
    }
}
