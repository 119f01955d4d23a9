//! Shared-ending trie over a corpus of place names.
//!
//! Every distinct tail of every name becomes exactly one [`SuffixNode`].
//! Nodes live in an arena indexed by [`NodeId`] and a value map resolves a
//! tail string to its node, so inserting a tail that already exists returns
//! the existing node. An edge runs from a tail to every tail one character
//! longer that occurs in the corpus; consequently each node has at most one
//! in-neighbour (its [`SuffixNode::parent`]) and nodes without one are the
//! single-character roots.
//!
//! Tails are measured in Unicode scalar values, so `"zwönitz"` yields the
//! tails `"zwönitz"`, `"wönitz"`, `"önitz"` and so on.

mod branching;

use std::{collections::HashMap, fmt};

use tracing::{debug, instrument};

use crate::{
    error::{RecordSourceError, TrieError},
    record::{CityRecord, RecordId, RecordSource},
};

pub use self::branching::{BranchingClass, BranchingSummary};

/// Identifier of a node inside one [`SuffixTrie`].
///
/// Identifiers are only meaningful for the trie that minted them.
///
/// # Examples
/// ```
/// use toponym_core::NodeId;
///
/// let id = NodeId::new(7);
/// assert_eq!(id.get(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn new(id: usize) -> Self { Self(id) }

    /// Returns the underlying arena index.
    #[rustfmt::skip]
    #[must_use]
    pub fn get(self) -> usize { self.0 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One distinct tail string of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixNode {
    value: Box<str>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    records: Vec<RecordId>,
}

impl SuffixNode {
    fn new(value: &str) -> Self {
        Self {
            value: Box::from(value),
            parent: None,
            children: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Returns the tail string represented by this node.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the one-character-shorter tail, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the one-character-longer tails in first-seen order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the records whose complete name equals this tail.
    #[must_use]
    pub fn records(&self) -> &[RecordId] {
        &self.records
    }

    /// Returns whether the node has no in-neighbour.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns whether some record carries exactly this name.
    #[must_use]
    pub fn is_name(&self) -> bool {
        !self.records.is_empty()
    }

    /// Returns the number of out-neighbours.
    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.children.len()
    }
}

/// Shared-ending trie owning the corpus records it was built from.
///
/// # Examples
/// ```
/// use toponym_core::{CityRecord, SuffixTrie};
///
/// let trie = SuffixTrie::from_records([
///     CityRecord::new("leipzig", 51.34, 12.37),
///     CityRecord::new("pelzig", 51.10, 12.10),
/// ])?;
/// let zig = trie.find("zig").expect("shared tail exists");
/// assert_eq!(trie.node(zig).map(|node| node.children().len()), Some(2));
/// assert_eq!(trie.roots().len(), 1);
/// # Ok::<(), toponym_core::TrieError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SuffixTrie {
    nodes: Vec<SuffixNode>,
    index: HashMap<Box<str>, NodeId>,
    roots: Vec<NodeId>,
    records: Vec<CityRecord>,
}

impl SuffixTrie {
    /// Creates an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trie from an iterator of records.
    ///
    /// # Errors
    /// Returns [`TrieError::EmptyName`] for the first record without a name.
    pub fn from_records<I>(records: I) -> Result<Self, TrieError>
    where
        I: IntoIterator<Item = CityRecord>,
    {
        let mut trie = Self::new();
        for record in records {
            trie.insert(record)?;
        }
        Ok(trie)
    }

    /// Builds a trie from every record of `source`.
    ///
    /// # Errors
    /// Returns [`TrieError::EmptySource`] when the source has no records,
    /// [`TrieError::RecordSource`] when a lookup fails, and
    /// [`TrieError::EmptyName`] for records without a name.
    #[instrument(
        name = "trie.build",
        err,
        skip(source),
        fields(data_source = %source.name(), records = source.len()),
    )]
    pub fn try_from_source<S: RecordSource>(source: &S) -> Result<Self, TrieError> {
        if source.is_empty() {
            return Err(TrieError::EmptySource {
                data_source: source.name().into(),
            });
        }
        let mut trie = Self::new();
        for index in 0..source.len() {
            let record = source
                .record(index)
                .map_err(|error| wrap_source_error(source, error))?;
            trie.insert(record.clone())?;
        }
        debug!(
            nodes = trie.node_count(),
            roots = trie.roots.len(),
            "trie construction completed"
        );
        Ok(trie)
    }

    /// Inserts a record, creating or reusing a node for every tail of its
    /// name and linking each tail to the next longer one.
    ///
    /// # Errors
    /// Returns [`TrieError::EmptyName`] when the record's name is empty.
    pub fn insert(&mut self, record: CityRecord) -> Result<RecordId, TrieError> {
        if record.name().is_empty() {
            return Err(TrieError::EmptyName {
                record: self.records.len(),
            });
        }
        let record_id = RecordId::new(self.records.len());
        let mut longer: Option<NodeId> = None;
        for (offset, _) in record.name().char_indices() {
            let tail = record.name().get(offset..).unwrap_or_default();
            let node = self.obtain(tail);
            match longer {
                None => self.node_mut(node).records.push(record_id),
                Some(longer) => self.link(node, longer),
            }
            longer = Some(node);
        }
        self.records.push(record);
        Ok(record_id)
    }

    fn obtain(&mut self, tail: &str) -> NodeId {
        if let Some(&existing) = self.index.get(tail) {
            return existing;
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(SuffixNode::new(tail));
        self.index.insert(Box::from(tail), id);
        if tail.chars().nth(1).is_none() {
            self.roots.push(id);
        }
        id
    }

    fn link(&mut self, shorter: NodeId, longer: NodeId) {
        let target = self.node_mut(longer);
        if target.parent.is_some() {
            return;
        }
        target.parent = Some(shorter);
        self.node_mut(shorter).children.push(longer);
    }

    fn node_mut(&mut self, id: NodeId) -> &mut SuffixNode {
        &mut self.nodes[id.get()]
    }

    /// Returns the node for `id`, or `None` if the identifier is foreign.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SuffixNode> {
        self.nodes.get(id.get())
    }

    /// Returns the tail string of `id`, or an empty string for foreign ids.
    #[must_use]
    pub fn value(&self, id: NodeId) -> &str {
        self.node(id).map_or("", SuffixNode::value)
    }

    /// Looks up the node representing `value`.
    #[must_use]
    pub fn find(&self, value: &str) -> Option<NodeId> {
        self.index.get(value).copied()
    }

    /// Returns the out-neighbours of `id`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], SuffixNode::children)
    }

    /// Returns the in-neighbour of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(SuffixNode::parent)
    }

    /// Returns the roots in first-seen order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Iterates over every node that equals a complete corpus name.
    pub fn name_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.is_name())
            .map(|(id, _)| id)
    }

    /// Iterates over the distinct corpus names.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_name())
            .map(SuffixNode::value)
    }

    /// Returns the node arena; the node at position `i` has identifier `i`.
    #[must_use]
    pub fn nodes(&self) -> &[SuffixNode] {
        &self.nodes
    }

    /// Iterates over all nodes with their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SuffixNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of inserted records, duplicates included.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no record has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&CityRecord> {
        self.records.get(id.get())
    }

    /// Returns all records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    /// Collects every record whose name has the tail `id`, in ascending
    /// record order.
    #[must_use]
    pub fn subsumed_records(&self, id: NodeId) -> Vec<RecordId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            found.extend_from_slice(node.records());
            stack.extend_from_slice(node.children());
        }
        found.sort_unstable();
        found
    }

    /// Returns the branching class of `id`; leaves have none.
    #[must_use]
    pub fn branching_class(&self, id: NodeId) -> Option<BranchingClass> {
        self.node(id)
            .and_then(|node| BranchingClass::from_degree(node.out_degree()))
    }

    /// Returns every node whose branching class is `class`.
    #[must_use]
    pub fn nodes_in_class(&self, class: BranchingClass) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| BranchingClass::from_degree(node.out_degree()) == Some(class))
            .map(|(id, _)| id)
            .collect()
    }

    /// Counts nodes per branching class.
    #[must_use]
    pub fn branching_summary(&self) -> BranchingSummary {
        self.nodes
            .iter()
            .map(SuffixNode::out_degree)
            .fold(BranchingSummary::default(), BranchingSummary::with_degree)
    }

    /// Summarises the shape of the trie.
    #[must_use]
    pub fn summary(&self) -> TrieSummary {
        TrieSummary {
            nodes: self.node_count(),
            name_nodes: self.name_nodes().count(),
            records: self.record_count(),
            roots: self.roots.len(),
            branching: self.branching_summary(),
        }
    }
}

fn wrap_source_error<S: RecordSource>(source: &S, error: RecordSourceError) -> TrieError {
    TrieError::RecordSource {
        data_source: source.name().into(),
        error,
    }
}

/// Descriptive counts over a [`SuffixTrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieSummary {
    /// Number of suffix nodes.
    pub nodes: usize,
    /// Number of nodes equal to a complete name.
    pub name_nodes: usize,
    /// Number of records, duplicates included.
    pub records: usize,
    /// Number of roots.
    pub roots: usize,
    /// Nodes per branching class.
    pub branching: BranchingSummary,
}
