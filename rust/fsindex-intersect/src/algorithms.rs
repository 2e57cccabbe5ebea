//! Pairwise intersection of strictly increasing sequences.
//!
//! All functions assume duplicate-free ascending input and produce ascending
//! output. Probing variants iterate over `small` and search in `large`; they
//! stay correct with the roles swapped, only slower.

use std::cmp::Ordering;

pub fn merge<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}

pub fn binary_probe<T: Ord + Copy>(small: &[T], large: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(small.len());
    let mut lo = 0;
    for &x in small {
        lo += large[lo..].partition_point(|v| *v < x);
        if lo == large.len() {
            break;
        }
        if large[lo] == x {
            result.push(x);
            lo += 1;
        }
    }
    result
}

pub fn gallop<T: Ord + Copy>(small: &[T], large: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(small.len());
    let mut pos = 0;
    for &x in small {
        pos = gallop_to(large, pos, &x);
        if pos == large.len() {
            break;
        }
        if large[pos] == x {
            result.push(x);
            pos += 1;
        }
    }
    result
}

/// Returns the first index `i >= start` with `seq[i] >= x` (or `seq.len()`),
/// probing `start, start + 1, start + 2, start + 4, ...` before a binary
/// search inside the last bracket.
fn gallop_to<T: Ord>(seq: &[T], start: usize, x: &T) -> usize {
    // seq[lo - 1] < x (when lo > start) and seq[hi] >= x (when hi < len).
    let mut lo = start;
    let mut hi = start;
    let mut step = 1;
    while hi < seq.len() && seq[hi] < *x {
        lo = hi + 1;
        hi = start + step;
        step *= 2;
    }
    let hi = hi.min(seq.len());
    lo + seq[lo..hi].partition_point(|v| v < x)
}

#[cfg(test)]
mod tests {
    use super::{binary_probe, gallop, gallop_to, merge};

    #[test]
    fn test_gallop_to() {
        let seq: Vec<u32> = (0..100).map(|i| i * 2).collect();
        for start in [0, 1, 17, 99] {
            for x in 0..205 {
                let expected = start + seq[start..].partition_point(|v| *v < x);
                assert_eq!(gallop_to(&seq, start, &x), expected, "start {start} x {x}");
            }
        }
        assert_eq!(gallop_to(&seq, 100, &5), 100);
    }

    #[test]
    fn test_algorithms_agree_on_small_cases() {
        let a = [1u64, 3, 5, 7, 9, 11];
        let b = [2u64, 3, 4, 9, 10, 11, 12, 40];
        for f in [merge::<u64>, binary_probe::<u64>, gallop::<u64>] {
            assert_eq!(f(&a, &b), vec![3, 9, 11]);
            assert_eq!(f(&b, &a), vec![3, 9, 11]);
            assert!(f(&a, &[]).is_empty());
            assert!(f(&[], &b).is_empty());
            assert!(f(&[0, 2], &[1, 3]).is_empty());
        }
    }
}
