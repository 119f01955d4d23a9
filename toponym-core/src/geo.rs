//! Geographic spread of the records under a suffix node.
//!
//! The evaluator collects every record whose name ends with the node's
//! suffix, takes the Euclidean distance between each unordered pair of
//! `(latitude, longitude)` points and reduces them to descriptive
//! statistics. Results are cached per node in a concurrent map so the
//! evaluator can be shared across threads.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::{instrument, trace};

use crate::{
    error::GeoError,
    record::CityRecord,
    trie::{NodeId, SuffixTrie},
};

/// Descriptive statistics of pairwise distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoStatistics {
    /// Smallest pairwise distance.
    pub min: f64,
    /// Largest pairwise distance.
    pub max: f64,
    /// Mean pairwise distance.
    pub mean: f64,
    /// Sample standard deviation of the pairwise distances.
    pub stddev: f64,
    /// Number of records the distances were taken over.
    pub records: usize,
    /// Number of unordered pairs.
    pub pairs: usize,
}

impl GeoStatistics {
    /// Reduces `distances` to statistics; returns `None` when it is empty.
    ///
    /// The standard deviation uses the `n - 1` denominator and is zero for a
    /// single distance.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::GeoStatistics;
    ///
    /// let stats = GeoStatistics::from_distances(&[1.0, 3.0], 3).expect("two distances");
    /// assert_eq!((stats.min, stats.max, stats.mean), (1.0, 3.0, 2.0));
    /// assert!((stats.stddev - 2.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_distances(distances: &[f64], records: usize) -> Option<Self> {
        let mut running = RunningStats::default();
        for &distance in distances {
            running.push(distance);
        }
        running.finish(records)
    }
}

/// Single-pass accumulator using Welford's update for mean and variance.
#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    squares: f64,
}

impl RunningStats {
    fn push(&mut self, distance: f64) {
        if self.count == 0 {
            self.min = distance;
            self.max = distance;
        } else {
            self.min = self.min.min(distance);
            self.max = self.max.max(distance);
        }
        self.count += 1;
        let delta = distance - self.mean;
        self.mean += delta / self.count as f64;
        self.squares += delta * (distance - self.mean);
    }

    fn finish(self, records: usize) -> Option<GeoStatistics> {
        if self.count == 0 {
            return None;
        }
        let stddev = if self.count < 2 {
            0.0
        } else {
            (self.squares / (self.count - 1) as f64).sqrt()
        };
        Some(GeoStatistics {
            min: self.min,
            max: self.max,
            mean: self.mean,
            stddev,
            records,
            pairs: self.count,
        })
    }
}

/// Euclidean distance between two records in the `(latitude, longitude)`
/// plane.
#[must_use]
pub fn euclidean(a: &CityRecord, b: &CityRecord) -> f64 {
    (a.latitude() - b.latitude()).hypot(a.longitude() - b.longitude())
}

/// Cached geographic evaluator bound to one trie.
///
/// # Examples
/// ```
/// use toponym_core::{CityRecord, GeoEvaluator, SuffixTrie};
///
/// let trie = SuffixTrie::from_records([
///     CityRecord::new("leipzig", 0.0, 0.0),
///     CityRecord::new("pelzig", 3.0, 4.0),
/// ])?;
/// let geo = GeoEvaluator::new(&trie);
/// let zig = trie.find("zig").expect("shared tail exists");
/// let stats = geo.distance_stats(zig)?;
/// assert_eq!(stats.mean, 5.0);
/// assert_eq!(stats.stddev, 0.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct GeoEvaluator<'t> {
    trie: &'t SuffixTrie,
    cache: DashMap<NodeId, GeoStatistics>,
    computations: AtomicUsize,
}

impl<'t> GeoEvaluator<'t> {
    /// Creates an evaluator with an empty cache.
    #[must_use]
    pub fn new(trie: &'t SuffixTrie) -> Self {
        Self {
            trie,
            cache: DashMap::new(),
            computations: AtomicUsize::new(0),
        }
    }

    /// Returns the distance statistics of the records under `id`.
    ///
    /// # Errors
    /// Returns [`GeoError::UnknownNode`] for foreign identifiers and
    /// [`GeoError::InsufficientData`] when fewer than two records sit under
    /// the node.
    #[instrument(level = "debug", skip(self), fields(suffix = self.trie.value(id)))]
    pub fn distance_stats(&self, id: NodeId) -> Result<GeoStatistics, GeoError> {
        if let Some(cached) = self.cache.get(&id) {
            record_hit();
            return Ok(*cached);
        }
        record_miss();

        let started = Instant::now();
        let stats = self.compute(id)?;
        record_latency(started.elapsed());
        self.cache.insert(id, stats);
        Ok(stats)
    }

    fn compute(&self, id: NodeId) -> Result<GeoStatistics, GeoError> {
        let node = self
            .trie
            .node(id)
            .ok_or(GeoError::UnknownNode { node: id })?;
        let records: Vec<&CityRecord> = self
            .trie
            .subsumed_records(id)
            .into_iter()
            .filter_map(|record| self.trie.record(record))
            .collect();

        let mut running = RunningStats::default();
        for (index, a) in records.iter().enumerate() {
            for b in records.iter().skip(index + 1) {
                running.push(euclidean(a, b));
            }
        }
        self.computations.fetch_add(1, Ordering::Relaxed);
        trace!(records = records.len(), pairs = running.count, "pairwise distances computed");

        running.finish(records.len()).ok_or_else(|| {
            GeoError::InsufficientData {
                suffix: node.value().into(),
                records: records.len(),
            }
        })
    }

    /// Returns how many pairwise passes have run.
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Returns the number of cached statistics.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(feature = "metrics")]
fn record_hit() {
    metrics::counter!("geo_cache_hits").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_hit() {}

#[cfg(feature = "metrics")]
fn record_miss() {
    metrics::counter!("geo_cache_misses").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_miss() {}

#[cfg(feature = "metrics")]
fn record_latency(elapsed: Duration) {
    metrics::histogram!("geo_distance_latency_seconds").record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_latency(_elapsed: Duration) {}
