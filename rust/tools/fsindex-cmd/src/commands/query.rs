//! Query command implementation

use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{open_index, parse_strategy};

/// Run the query command
pub fn run(
    index_dir: String,
    terms: Vec<String>,
    strategy: String,
    output: Option<String>,
) -> Result<()> {
    let strategy = parse_strategy(&strategy)?;
    let index = open_index(&index_dir)?;
    let started = std::time::Instant::now();

    match output {
        Some(path) => {
            let count = index
                .query_to_store(&terms, strategy, Path::new(&path))
                .with_context(|| format!("Failed to write query result to {path}"))?;
            println!(
                "{count} documents written to {path} in {:.2?}",
                started.elapsed()
            );
        }
        None => {
            let ids = index
                .query_with(&terms, strategy)
                .with_context(|| format!("Query {terms:?} failed"))?;
            for id in &ids {
                println!("{id}");
            }
            eprintln!("{} documents in {:.2?}", ids.len(), started.elapsed());
        }
    }
    log::debug!("posting lists read: {}", index.posting_reads());
    Ok(())
}
