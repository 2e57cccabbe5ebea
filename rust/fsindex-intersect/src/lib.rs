//! Intersection Engine: sorted-set intersection of posting lists.
//!
//! A family of pairwise algorithms ([`algorithms`]) over strictly increasing
//! slices, a pure dispatch function picking one by length ratio
//! ([`select_strategy`]), and an N-way fold ([`Intersector::intersect`]) that
//! works shortest-first and stops reading input once the running result is
//! empty.
//!
//! The engine is stateless and reentrant. Inputs are assumed duplicate-free
//! and ascending; with [`IntersectOptions::validate`] on (the default in debug
//! builds) a violation is reported as `PrecondViolation` instead of producing
//! an unspecified result.

use serde::{Deserialize, Serialize};

pub mod algorithms;
pub mod nway;
pub mod strategy;

pub use nway::{Intersector, SortedIds, validate_strictly_increasing};
pub use strategy::{DEFAULT_RATIO_THRESHOLD, Strategy, select_strategy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
    /// See [`select_strategy`].
    pub ratio_threshold: f64,
    /// Check that every input list is strictly increasing.
    pub validate: bool,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        IntersectOptions {
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            validate: cfg!(debug_assertions),
        }
    }
}

/// Intersects two strictly increasing lists with the given strategy, using
/// the default adaptive threshold. No validation is performed.
pub fn intersect_pair<T: Ord + Copy>(a: &[T], b: &[T], strategy: Strategy) -> Vec<T> {
    intersect_sorted(a, b, strategy, DEFAULT_RATIO_THRESHOLD)
}

pub(crate) fn intersect_sorted<T: Ord + Copy>(
    a: &[T],
    b: &[T],
    strategy: Strategy,
    ratio_threshold: f64,
) -> Vec<T> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match strategy.resolve(small.len(), large.len(), ratio_threshold) {
        Strategy::Merge => algorithms::merge(small, large),
        Strategy::BinaryProbe => algorithms::binary_probe(small, large),
        Strategy::Gallop | Strategy::Adaptive => algorithms::gallop(small, large),
    }
}
