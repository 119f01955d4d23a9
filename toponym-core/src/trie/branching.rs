//! Branching classes derived from a node's out-degree.

use std::fmt;

/// How many distinct characters are prepended to a tail across the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchingClass {
    /// Exactly one out-neighbour.
    Lonely,
    /// Two to five out-neighbours.
    Normal,
    /// Six to fifteen out-neighbours.
    Frequent,
    /// Sixteen or more out-neighbours.
    VeryFrequent,
}

impl BranchingClass {
    /// All classes in ascending order of out-degree.
    pub const ALL: [Self; 4] = [
        Self::Lonely,
        Self::Normal,
        Self::Frequent,
        Self::VeryFrequent,
    ];

    /// Classifies an out-degree. Leaves (degree zero) have no class.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::BranchingClass;
    ///
    /// assert_eq!(BranchingClass::from_degree(0), None);
    /// assert_eq!(BranchingClass::from_degree(5), Some(BranchingClass::Normal));
    /// assert_eq!(BranchingClass::from_degree(16), Some(BranchingClass::VeryFrequent));
    /// ```
    #[must_use]
    pub const fn from_degree(degree: usize) -> Option<Self> {
        match degree {
            0 => None,
            1 => Some(Self::Lonely),
            2..=5 => Some(Self::Normal),
            6..=15 => Some(Self::Frequent),
            _ => Some(Self::VeryFrequent),
        }
    }

    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lonely => "lonely",
            Self::Normal => "normal",
            Self::Frequent => "frequent",
            Self::VeryFrequent => "very_frequent",
        }
    }
}

impl fmt::Display for BranchingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node counts per [`BranchingClass`], plus the leaves that have none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchingSummary {
    /// Nodes without out-neighbours.
    pub leaves: usize,
    /// Nodes with one out-neighbour.
    pub lonely: usize,
    /// Nodes with two to five out-neighbours.
    pub normal: usize,
    /// Nodes with six to fifteen out-neighbours.
    pub frequent: usize,
    /// Nodes with sixteen or more out-neighbours.
    pub very_frequent: usize,
}

impl BranchingSummary {
    pub(crate) const fn with_degree(mut self, degree: usize) -> Self {
        match BranchingClass::from_degree(degree) {
            None => self.leaves += 1,
            Some(BranchingClass::Lonely) => self.lonely += 1,
            Some(BranchingClass::Normal) => self.normal += 1,
            Some(BranchingClass::Frequent) => self.frequent += 1,
            Some(BranchingClass::VeryFrequent) => self.very_frequent += 1,
        }
        self
    }

    /// Returns the count for `class`.
    #[must_use]
    pub const fn count(&self, class: BranchingClass) -> usize {
        match class {
            BranchingClass::Lonely => self.lonely,
            BranchingClass::Normal => self.normal,
            BranchingClass::Frequent => self.frequent,
            BranchingClass::VeryFrequent => self.very_frequent,
        }
    }

    /// Returns the number of nodes with at least one out-neighbour.
    #[must_use]
    pub const fn branching(&self) -> usize {
        self.lonely + self.normal + self.frequent + self.very_frequent
    }

    /// Returns the number of classified nodes plus leaves.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.leaves + self.branching()
    }
}
