//! Inspect command implementation

use anyhow::{Context, Result};
use fsindex::manifest::StoreInfo;

use crate::{commands::open_index, utils};

struct StoreSummary {
    file: String,
    width: u32,
    records: u64,
    size: u64,
}

/// Run the inspect command
pub fn run(index_dir: String, terms: Option<usize>) -> Result<()> {
    let index = open_index(&index_dir)?;
    let manifest = index.manifest();

    println!("Index: {}", index.dir().display());
    println!("Schema version: {}", manifest.schema_version);
    println!("Written with backend: {}", manifest.backend);
    println!("Terms: {}", index.term_count());
    println!("Postings: {}", index.posting_count());
    println!(
        "Build stats: {}",
        serde_json::to_string(&manifest.stats).context("Failed to serialize build stats")?
    );

    println!("Stores:");
    let mut total = 0;
    for info in [&manifest.postings, &manifest.dictionary, &manifest.terms] {
        let summary = summarize_store(&index, info)?;
        total += summary.size;
        println!(
            "  {:<16} width {:>3}  records {:>12}  {}",
            summary.file,
            summary.width,
            summary.records,
            utils::format_size(summary.size)
        );
    }
    println!("Total size: {}", utils::format_size(total));

    if let Some(limit) = terms {
        println!("Terms (first {limit}):");
        for item in index.terms().take(limit) {
            let (term, entry) = item.context("Failed to read dictionary")?;
            println!(
                "  {}\t{}",
                String::from_utf8_lossy(&term),
                entry.postings_len
            );
        }
    }
    Ok(())
}

fn summarize_store(index: &fsindex::Index, info: &StoreInfo) -> Result<StoreSummary> {
    let path = index.dir().join(&info.file);
    let size = std::fs::metadata(&path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok(StoreSummary {
        file: info.file.clone(),
        width: info.width,
        records: info.len,
        size,
    })
}
