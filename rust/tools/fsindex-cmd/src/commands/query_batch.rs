//! Query-batch command implementation

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::{
    commands::{open_index, parse_strategy},
    utils,
};

/// Run the query-batch command
pub fn run(
    index_dir: String,
    queries: String,
    strategy: String,
    threads: Option<usize>,
) -> Result<()> {
    utils::validate_file_exists(&queries)?;
    let strategy = parse_strategy(&strategy)?;
    let index = open_index(&index_dir)?;

    let text = std::fs::read_to_string(&queries)
        .with_context(|| format!("Failed to read queries from {queries}"))?;
    let batch: Vec<Vec<&str>> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|terms| !terms.is_empty())
        .collect();

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool.build().context("Failed to create thread pool")?;

    let started = std::time::Instant::now();
    let results = pool.install(|| {
        batch
            .par_iter()
            .map(|terms| index.query_with(terms.as_slice(), strategy).map(|ids| ids.len()))
            .collect::<Vec<_>>()
    });
    let elapsed = started.elapsed();

    let mut total = 0usize;
    for (terms, result) in batch.iter().zip(results) {
        let count = result.with_context(|| format!("Query {terms:?} failed"))?;
        total += count;
        println!("{}\t{count}", terms.join(" "));
    }
    eprintln!(
        "{} queries on {} threads in {:.2?}, {} matches, {} posting list reads",
        batch.len(),
        pool.current_num_threads(),
        elapsed,
        total,
        index.posting_reads()
    );
    Ok(())
}
