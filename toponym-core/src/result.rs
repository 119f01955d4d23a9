//! Result types for cluster selection.

use std::collections::BTreeSet;

use crate::trie::{NodeId, SuffixTrie};

/// Ordered set of selected cluster nodes.
///
/// # Examples
/// ```
/// use toponym_core::{ClusterSet, NodeId};
///
/// let set: ClusterSet = [NodeId::new(4), NodeId::new(1), NodeId::new(4)].into_iter().collect();
/// assert_eq!(set.len(), 2);
/// assert!(set.contains(NodeId::new(1)));
/// assert_eq!(set.iter().next(), Some(NodeId::new(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSet {
    nodes: BTreeSet<NodeId>,
}

impl ClusterSet {
    /// Returns the number of selected nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether `id` was selected.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Iterates over the selected nodes in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Returns the suffixes of the selected nodes in lexicographic order.
    #[must_use]
    pub fn suffixes<'t>(&self, trie: &'t SuffixTrie) -> Vec<&'t str> {
        let mut suffixes: Vec<&str> = self.iter().map(|id| trie.value(id)).collect();
        suffixes.sort_unstable();
        suffixes
    }

    /// Lists every `(ancestor, descendant)` pair of selected nodes where the
    /// ancestor's suffix is a tail of the descendant's.
    #[must_use]
    pub fn nested_pairs(&self, trie: &SuffixTrie) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        for descendant in self.iter() {
            let mut current = trie.parent(descendant);
            while let Some(ancestor) = current {
                if self.contains(ancestor) {
                    pairs.push((ancestor, descendant));
                }
                current = trie.parent(ancestor);
            }
        }
        pairs
    }
}

impl FromIterator<NodeId> for ClusterSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ClusterSet {
    type Item = NodeId;
    type IntoIter = std::collections::btree_set::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
