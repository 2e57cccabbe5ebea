use std::{fmt, str::FromStr};

use fsindex_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

/// Length ratio at or above which [`Strategy::Adaptive`] switches from a
/// linear merge to galloping.
pub const DEFAULT_RATIO_THRESHOLD: f64 = 2.0;

/// Pairwise intersection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Lock-step scan of both lists, `O(|A| + |B|)`.
    Merge,
    /// Binary search of each element of the shorter list in the longer one,
    /// `O(|A| log |B|)`.
    BinaryProbe,
    /// Exponential probing from the last match position, then binary search
    /// within the bracket.
    Gallop,
    /// [`Merge`](Strategy::Merge) or [`Gallop`](Strategy::Gallop), picked per
    /// pair by [`select_strategy`].
    #[default]
    Adaptive,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Merge,
        Strategy::BinaryProbe,
        Strategy::Gallop,
        Strategy::Adaptive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Merge => "merge",
            Strategy::BinaryProbe => "binary-probe",
            Strategy::Gallop => "gallop",
            Strategy::Adaptive => "adaptive",
        }
    }

    /// Resolves `Adaptive` to a concrete algorithm for lists of the given
    /// lengths; concrete strategies are returned unchanged.
    pub fn resolve(self, len_a: usize, len_b: usize, ratio_threshold: f64) -> Strategy {
        match self {
            Strategy::Adaptive => select_strategy(len_a, len_b, ratio_threshold),
            other => other,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Strategy> {
        Strategy::ALL
            .into_iter()
            .find(|st| st.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_arg("strategy", format!("unknown strategy '{s}'")))
    }
}

/// Picks the algorithm for intersecting lists of `len_a` and `len_b` elements.
///
/// With `ratio = max / min`, a ratio below `ratio_threshold` selects
/// [`Strategy::Merge`], anything else [`Strategy::Gallop`]. An empty side
/// selects `Merge`, which terminates without comparisons.
pub fn select_strategy(len_a: usize, len_b: usize, ratio_threshold: f64) -> Strategy {
    let (small, large) = if len_a <= len_b {
        (len_a, len_b)
    } else {
        (len_b, len_a)
    };
    if small == 0 {
        return Strategy::Merge;
    }
    let ratio = large as f64 / small as f64;
    if ratio < ratio_threshold {
        Strategy::Merge
    } else {
        Strategy::Gallop
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_RATIO_THRESHOLD, Strategy, select_strategy};

    #[test]
    fn test_select_strategy() {
        let t = DEFAULT_RATIO_THRESHOLD;
        assert_eq!(select_strategy(10, 1, t), Strategy::Gallop);
        assert_eq!(select_strategy(1, 10, t), Strategy::Gallop);
        assert_eq!(select_strategy(100, 150, t), Strategy::Merge);
        assert_eq!(select_strategy(100, 199, t), Strategy::Merge);
        assert_eq!(select_strategy(100, 200, t), Strategy::Gallop);
        assert_eq!(select_strategy(0, 1000, t), Strategy::Merge);
        assert_eq!(select_strategy(5, 5, t), Strategy::Merge);
        assert_eq!(select_strategy(5, 40, 10.0), Strategy::Merge);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(Strategy::Adaptive.resolve(1, 10, 2.0), Strategy::Gallop);
        assert_eq!(Strategy::BinaryProbe.resolve(10, 10, 2.0), Strategy::BinaryProbe);
    }

    #[test]
    fn test_parse_and_display() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("Binary-Probe".parse::<Strategy>().unwrap(), Strategy::BinaryProbe);
        assert!("hash".parse::<Strategy>().is_err());
    }
}
