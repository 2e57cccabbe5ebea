//! Export-delta command implementation

use anyhow::{Context, Result};
use fsindex::postings::POSTING_RECORD_WIDTH;
use std::path::PathBuf;

use crate::{commands::open_index, utils};

pub const DEFAULT_OUTPUT_FILE: &str = "postings.delta";

/// Run the export-delta command
pub fn run(index_dir: String, output: Option<String>) -> Result<()> {
    let index = open_index(&index_dir)?;
    let output = output
        .map(PathBuf::from)
        .unwrap_or_else(|| index.dir().join(DEFAULT_OUTPUT_FILE));

    let started = std::time::Instant::now();
    let coded = index
        .export_delta()
        .context("Failed to delta-code posting lists")?;
    let bytes = coded.to_bytes();
    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let raw = index.posting_count() * POSTING_RECORD_WIDTH as u64;
    println!("Exported {} posting lists to {}", coded.list_count(), output.display());
    println!("  document ids:  {}", coded.id_count());
    println!("  raw postings:  {}", utils::format_size(raw));
    println!("  delta coded:   {}", utils::format_size(bytes.len() as u64));
    if !bytes.is_empty() {
        println!("  ratio:         {:.2}x", raw as f64 / bytes.len() as f64);
    }
    println!("  elapsed:       {:.2?}", started.elapsed());
    Ok(())
}
