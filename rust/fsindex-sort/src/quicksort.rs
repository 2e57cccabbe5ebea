//! In-place quicksort with a selectable pivot strategy.
//!
//! Used to order spill runs before they are written out. The pivot strategy
//! matters for adversarial or already-sorted input (a corpus read in document
//! order produces long sorted stretches per term), so it is configurable, and
//! sub-ranges at or below `cutoff` elements are handed to the standard library
//! sort.

use std::{fmt, str::FromStr};

use fsindex_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PivotSelector {
    /// First element of the range.
    First,
    /// Uniformly random element.
    Random,
    /// Median of the first, middle and last elements.
    #[default]
    MedianOfThree,
    /// Median of three medians-of-three spread across the range.
    TukeyNinther,
}

impl PivotSelector {
    pub const ALL: [PivotSelector; 4] = [
        PivotSelector::First,
        PivotSelector::Random,
        PivotSelector::MedianOfThree,
        PivotSelector::TukeyNinther,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PivotSelector::First => "first",
            PivotSelector::Random => "random",
            PivotSelector::MedianOfThree => "median-of-three",
            PivotSelector::TukeyNinther => "tukey-ninther",
        }
    }

    /// Picks a pivot index within `lo..hi` (`hi - lo >= 3`).
    fn select<T: Ord>(&self, items: &[T], lo: usize, hi: usize, rng: &mut fastrand::Rng) -> usize {
        match self {
            PivotSelector::First => lo,
            PivotSelector::Random => rng.usize(lo..hi),
            PivotSelector::MedianOfThree => {
                let last = hi - 1;
                median3(items, lo, lo + (last - lo) / 2, last)
            }
            PivotSelector::TukeyNinther => {
                let n = hi - lo;
                let last = hi - 1;
                let mid = lo + n / 2;
                let delta = n / 8;
                let m1 = median3(items, lo, lo + delta, lo + 2 * delta);
                let m2 = median3(items, mid - delta, mid, mid + delta);
                let m3 = median3(items, last - 2 * delta, last - delta, last);
                median3(items, m1, m2, m3)
            }
        }
    }
}

impl fmt::Display for PivotSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PivotSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<PivotSelector> {
        PivotSelector::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_arg("pivot", format!("unknown pivot selector '{s}'")))
    }
}

/// Sorts `items` in place.
pub fn quicksort<T: Ord>(items: &mut [T], pivot: PivotSelector, cutoff: usize) {
    let mut rng = fastrand::Rng::new();
    sort_range(items, 0, items.len(), pivot, cutoff, &mut rng);
}

fn sort_range<T: Ord>(
    items: &mut [T],
    mut lo: usize,
    mut hi: usize,
    pivot: PivotSelector,
    cutoff: usize,
    rng: &mut fastrand::Rng,
) {
    // Recurse into the smaller side and loop on the larger one, which bounds
    // the stack depth by log2(n) regardless of pivot quality.
    loop {
        let size = hi - lo;
        if size < 2 {
            return;
        }
        if size == 2 {
            if items[lo] > items[lo + 1] {
                items.swap(lo, lo + 1);
            }
            return;
        }
        if size <= cutoff {
            items[lo..hi].sort_unstable();
            return;
        }
        let mid = partition(items, lo, hi, pivot, rng);
        if mid - lo < hi - (mid + 1) {
            sort_range(items, lo, mid, pivot, cutoff, rng);
            lo = mid + 1;
        } else {
            sort_range(items, mid + 1, hi, pivot, cutoff, rng);
            hi = mid;
        }
    }
}

/// Partitions `items[lo..hi]` around the selected pivot and returns the
/// pivot's final index.
fn partition<T: Ord>(
    items: &mut [T],
    lo: usize,
    hi: usize,
    pivot: PivotSelector,
    rng: &mut fastrand::Rng,
) -> usize {
    let p = pivot.select(items, lo, hi, rng);
    if p != lo {
        items.swap(lo, p);
    }

    let mut i = lo + 1;
    let mut j = hi - 1;
    while i <= j {
        while i <= j && items[i] < items[lo] {
            i += 1;
        }
        while i <= j && items[lo] < items[j] {
            j -= 1;
        }
        if i <= j {
            items.swap(i, j);
            i += 1;
            j -= 1;
        }
    }
    items.swap(lo, j);
    j
}

fn median3<T: Ord>(items: &[T], i: usize, j: usize, k: usize) -> usize {
    let (ti, tj, tk) = (&items[i], &items[j], &items[k]);
    if ti < tj {
        if tj < tk {
            j
        } else if ti < tk {
            k
        } else {
            i
        }
    } else if ti < tk {
        i
    } else if tj < tk {
        k
    } else {
        j
    }
}
