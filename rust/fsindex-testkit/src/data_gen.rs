//! Synthetic posting lists and (term, document) streams.

use std::{
    collections::BTreeSet,
    io::{BufWriter, Seek, SeekFrom, Write},
};

/// Generates `len` distinct ids drawn uniformly from `0..universe`, sorted
/// ascending.
///
/// Panics if `universe < len`.
pub fn sorted_ids(rng: &mut fastrand::Rng, len: usize, universe: u64) -> Vec<u64> {
    assert!(universe >= len as u64, "universe {universe} < len {len}");
    if len as u64 * 2 > universe {
        // Dense: pick by rejection from the complement instead.
        let mut excluded = BTreeSet::new();
        while (excluded.len() as u64) < universe - len as u64 {
            excluded.insert(rng.u64(0..universe));
        }
        return (0..universe).filter(|id| !excluded.contains(id)).collect();
    }
    let mut ids = BTreeSet::new();
    while ids.len() < len {
        ids.insert(rng.u64(0..universe));
    }
    ids.into_iter().collect()
}

/// Parameters of a generated list pair.
#[derive(Debug, Clone, Copy)]
pub struct PairShape {
    /// Length of the shorter list.
    pub small_len: usize,
    /// `large_len / small_len`.
    pub ratio: usize,
    /// Fraction of the shorter list's ids that also occur in the longer one.
    pub overlap: f64,
}

/// Generates a (short, long) pair of sorted, duplicate-free id lists with the
/// given length ratio and approximate overlap.
pub fn list_pair(rng: &mut fastrand::Rng, shape: PairShape) -> (Vec<u64>, Vec<u64>) {
    let large_len = shape.small_len * shape.ratio.max(1);
    let universe = (large_len as u64 * 4).max(16);
    let large = sorted_ids(rng, large_len, universe);
    let large_set: BTreeSet<u64> = large.iter().copied().collect();

    let shared = ((shape.small_len as f64) * shape.overlap.clamp(0.0, 1.0)).round() as usize;
    let mut small = BTreeSet::new();
    if !large.is_empty() {
        while small.len() < shared.min(large.len()) {
            small.insert(large[rng.usize(0..large.len())]);
        }
    }
    while small.len() < shape.small_len {
        let id = rng.u64(0..universe);
        if !large_set.contains(&id) {
            small.insert(id);
        }
    }
    (small.into_iter().collect(), large)
}

/// Generates `count` random (term, document id) pairs over a vocabulary of
/// `terms` words and `docs` documents. Term popularity is skewed so a few
/// terms get long posting lists.
pub fn posting_pairs(
    rng: &mut fastrand::Rng,
    terms: usize,
    docs: u64,
    count: usize,
) -> Vec<(String, u64)> {
    assert!(terms > 0 && docs > 0);
    (0..count)
        .map(|_| {
            // Square of a uniform draw biases towards low term numbers.
            let r = rng.f64();
            let term = ((r * r) * terms as f64) as usize;
            (term_name(term.min(terms - 1)), rng.u64(0..docs))
        })
        .collect()
}

pub fn term_name(n: usize) -> String {
    format!("t{n:05}")
}

/// Writes `pairs` as `term<TAB>doc_id` lines into a temporary file,
/// positioned at the start.
pub fn write_pairs_tsv(pairs: &[(String, u64)]) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    {
        let mut writer = BufWriter::new(&mut file);
        for (term, doc) in pairs {
            writeln!(writer, "{term}\t{doc}")?;
        }
        writer.flush()?;
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_ids() {
        let mut rng = fastrand::Rng::with_seed(1);
        for (len, universe) in [(0, 10), (10, 10), (7, 10), (100, 100_000)] {
            let ids = sorted_ids(&mut rng, len, universe);
            assert_eq!(ids.len(), len);
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            assert!(ids.iter().all(|&id| id < universe));
        }
    }

    #[test]
    fn test_list_pair_shape() {
        let mut rng = fastrand::Rng::with_seed(2);
        let shape = PairShape {
            small_len: 100,
            ratio: 10,
            overlap: 0.5,
        };
        let (small, large) = list_pair(&mut rng, shape);
        assert_eq!(small.len(), 100);
        assert_eq!(large.len(), 1000);
        let large: BTreeSet<u64> = large.into_iter().collect();
        let shared = small.iter().filter(|id| large.contains(id)).count();
        assert_eq!(shared, 50);
    }

    #[test]
    fn test_pairs_tsv() {
        let mut rng = fastrand::Rng::with_seed(3);
        let pairs = posting_pairs(&mut rng, 20, 50, 200);
        assert_eq!(pairs.len(), 200);
        let file = write_pairs_tsv(&pairs).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 200);
        assert!(text.lines().all(|line| line.starts_with('t') && line.contains('\t')));
    }
}
