//! Builder utilities for configuring cluster selection.
//!
//! Exposes the strategy selection surface and the validation applied before
//! a [`SuffixClustering`] is constructed.

use std::fmt;

use crate::error::ConfigError;

use super::SuffixClustering;

/// Tolerance applied when checking that significance weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Chooses how [`SuffixClustering::select`] picks cluster candidates.
///
/// # Examples
/// ```
/// use toponym_core::SelectionStrategy;
///
/// let strategy = SelectionStrategy::default();
/// assert_eq!(strategy, SelectionStrategy::Proportion);
/// assert_eq!(strategy.to_string(), "proportion");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Keep children that hold at least `proportion` of their parent.
    #[default]
    Proportion,
    /// Keep children whose share of their parent beats the n-gram model.
    Significance,
}

impl SelectionStrategy {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proportion => "proportion",
            Self::Significance => "significance",
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpolation weights for the zero-, one- and two-letter context
/// probabilities of the significance test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignificanceWeights {
    /// Weight of the plain letter probability.
    pub letter: f64,
    /// Weight of the probability given one following letter.
    pub bigram: f64,
    /// Weight of the probability given two following letters.
    pub trigram: f64,
}

impl Default for SignificanceWeights {
    fn default() -> Self {
        Self {
            letter: 0.2,
            bigram: 0.3,
            trigram: 0.5,
        }
    }
}

impl SignificanceWeights {
    /// Creates a weight triple without validating it.
    #[must_use]
    pub const fn new(letter: f64, bigram: f64, trigram: f64) -> Self {
        Self {
            letter,
            bigram,
            trigram,
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        for (parameter, value) in [
            ("letter_weight", self.letter),
            ("bigram_weight", self.bigram),
            ("trigram_weight", self.trigram),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { parameter, value });
            }
        }
        let sum = self.letter + self.bigram + self.trigram;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(self)
    }
}

/// Configures and constructs [`SuffixClustering`] instances.
///
/// # Examples
/// ```
/// use toponym_core::{SelectionStrategy, SuffixClusteringBuilder};
///
/// let clustering = SuffixClusteringBuilder::new()
///     .with_proportion(0.5)
///     .with_strategy(SelectionStrategy::Significance)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(clustering.proportion(), 0.5);
/// assert_eq!(clustering.strategy(), SelectionStrategy::Significance);
/// ```
#[derive(Debug, Clone)]
pub struct SuffixClusteringBuilder {
    proportion: f64,
    min_percent: f64,
    max_percent: f64,
    weights: SignificanceWeights,
    alpha: f64,
    strategy: SelectionStrategy,
}

impl Default for SuffixClusteringBuilder {
    fn default() -> Self {
        Self {
            proportion: 0.8,
            min_percent: 0.05,
            max_percent: 0.05,
            weights: SignificanceWeights::default(),
            alpha: 1.5,
            strategy: SelectionStrategy::Proportion,
        }
    }
}

impl SuffixClusteringBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::SuffixClusteringBuilder;
    ///
    /// let builder = SuffixClusteringBuilder::new();
    /// assert_eq!(builder.proportion(), 0.8);
    /// assert_eq!(builder.alpha(), 1.5);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the share of its parent a child must reach under
    /// [`SelectionStrategy::Proportion`].
    #[must_use]
    pub fn with_proportion(mut self, proportion: f64) -> Self {
        self.proportion = proportion;
        self
    }

    /// Returns the configured proportion.
    #[must_use]
    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    /// Sets the fraction of a tree's records below which a node is too
    /// small to be a cluster.
    #[must_use]
    pub fn with_min_percent(mut self, min_percent: f64) -> Self {
        self.min_percent = min_percent;
        self
    }

    /// Returns the configured lower size fraction.
    #[must_use]
    pub fn min_percent(&self) -> f64 {
        self.min_percent
    }

    /// Sets the fraction of a tree's records a cluster must leave out.
    #[must_use]
    pub fn with_max_percent(mut self, max_percent: f64) -> Self {
        self.max_percent = max_percent;
        self
    }

    /// Returns the configured upper size fraction.
    #[must_use]
    pub fn max_percent(&self) -> f64 {
        self.max_percent
    }

    /// Overrides the significance interpolation weights.
    #[must_use]
    pub fn with_weights(mut self, weights: SignificanceWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Returns the configured significance weights.
    #[must_use]
    pub fn weights(&self) -> SignificanceWeights {
        self.weights
    }

    /// Sets the factor by which an observed share must exceed the
    /// model's expectation.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Returns the configured significance factor.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Sets the strategy used by [`SuffixClustering::select`].
    #[must_use]
    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Validates the configuration and constructs a [`SuffixClustering`].
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] when a fraction lies outside
    /// `[0, 1]`, [`ConfigError::InvalidWeight`] or [`ConfigError::WeightSum`]
    /// for unusable weights, and [`ConfigError::InvalidAlpha`] when `alpha`
    /// is not positive and finite.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::{ConfigError, SuffixClusteringBuilder};
    ///
    /// let err = SuffixClusteringBuilder::new()
    ///     .with_min_percent(1.5)
    ///     .build()
    ///     .expect_err("1.5 is not a fraction");
    /// assert_eq!(err.code().as_str(), "CONFIG_OUT_OF_RANGE");
    /// ```
    pub fn build(self) -> Result<SuffixClustering, ConfigError> {
        let proportion = unit_interval("proportion", self.proportion)?;
        let min_percent = unit_interval("min_percent", self.min_percent)?;
        let max_percent = unit_interval("max_percent", self.max_percent)?;
        let weights = self.weights.validate()?;
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(ConfigError::InvalidAlpha { alpha: self.alpha });
        }

        Ok(SuffixClustering::new(
            proportion,
            min_percent,
            max_percent,
            weights,
            self.alpha,
            self.strategy,
        ))
    }
}

fn unit_interval(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { parameter, value })
    }
}
