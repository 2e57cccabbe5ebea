//! Bench command implementation

use anyhow::Result;
use fsindex_intersect::{Strategy, intersect_pair};
use fsindex_testkit::data_gen::{PairShape, list_pair};
use std::{
    hint::black_box,
    time::{Duration, Instant},
};

/// Run the bench command
pub fn run(
    small_len: usize,
    ratios: Vec<usize>,
    overlap: f64,
    iterations: usize,
    seed: u64,
) -> Result<()> {
    if small_len == 0 {
        anyhow::bail!("--small-len must be positive");
    }
    if iterations == 0 {
        anyhow::bail!("--iterations must be positive");
    }
    if !(0.0..=1.0).contains(&overlap) {
        anyhow::bail!("--overlap must be within [0, 1]");
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    println!(
        "{:>8} {:>10} {:>10} {:>14} {:>12} {:>12}",
        "ratio", "short", "long", "strategy", "best", "mean"
    );
    for ratio in ratios {
        let (small, large) = list_pair(
            &mut rng,
            PairShape {
                small_len,
                ratio,
                overlap,
            },
        );
        let mut expected = None;
        for strategy in Strategy::ALL {
            let (best, mean, matches) = measure(&small, &large, strategy, iterations);
            if *expected.get_or_insert(matches) != matches {
                anyhow::bail!("strategy {strategy} found {matches} matches, expected {expected:?}");
            }
            println!(
                "{:>8} {:>10} {:>10} {:>14} {:>12.2?} {:>12.2?}",
                ratio,
                small.len(),
                large.len(),
                strategy.name(),
                best,
                mean
            );
        }
        log::debug!("ratio {ratio}: {:?} matches", expected);
    }
    Ok(())
}

fn measure(
    small: &[u64],
    large: &[u64],
    strategy: Strategy,
    iterations: usize,
) -> (Duration, Duration, usize) {
    let mut best = Duration::MAX;
    let mut total = Duration::ZERO;
    let mut matches = 0;
    for _ in 0..iterations {
        let started = Instant::now();
        let result = intersect_pair(black_box(small), black_box(large), strategy);
        let elapsed = started.elapsed();
        matches = black_box(result).len();
        best = best.min(elapsed);
        total += elapsed;
    }
    (best, total / iterations as u32, matches)
}
