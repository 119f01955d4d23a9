//! Per-node candidate flags written by the significance strategy.

use crate::{
    result::ClusterSet,
    trie::{NodeId, SuffixTrie},
};

/// Candidate state of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlagState {
    /// Not selected.
    #[default]
    Unflagged,
    /// Selected as a cluster candidate.
    Candidate,
}

/// Candidate flags for every node of one [`SuffixTrie`].
///
/// # Examples
/// ```
/// use toponym_core::{CityRecord, ClusterFlags, SuffixTrie};
///
/// let trie = SuffixTrie::from_records([CityRecord::new("hof", 50.3, 11.9)])?;
/// let mut flags = ClusterFlags::new(&trie);
/// let of = trie.find("of").expect("tail exists");
/// flags.flag(of);
/// assert!(flags.is_flagged(of));
/// assert_eq!(flags.candidates().len(), 1);
/// flags.reset();
/// assert!(flags.candidates().is_empty());
/// # Ok::<(), toponym_core::TrieError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterFlags {
    states: Vec<FlagState>,
}

impl ClusterFlags {
    /// Creates a table with every node of `trie` unflagged.
    #[must_use]
    pub fn new(trie: &SuffixTrie) -> Self {
        Self {
            states: vec![FlagState::Unflagged; trie.node_count()],
        }
    }

    /// Marks `id` as a candidate. Foreign identifiers are ignored.
    pub fn flag(&mut self, id: NodeId) {
        if let Some(state) = self.states.get_mut(id.get()) {
            *state = FlagState::Candidate;
        }
    }

    /// Returns whether `id` is a candidate.
    #[must_use]
    pub fn is_flagged(&self, id: NodeId) -> bool {
        self.states.get(id.get()) == Some(&FlagState::Candidate)
    }

    /// Clears every flag.
    pub fn reset(&mut self) {
        self.states.fill(FlagState::Unflagged);
    }

    /// Collects every flagged node.
    #[must_use]
    pub fn candidates(&self) -> ClusterSet {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == FlagState::Candidate)
            .map(|(index, _)| NodeId::new(index))
            .collect()
    }
}
