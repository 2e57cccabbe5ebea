//! Command implementations for fsindex-cmd

use anyhow::{Context, Result};
use fsindex::{DocId, Index, IndexManifest};
use fsindex_fsas::StoreOptions;
use fsindex_intersect::Strategy;
use std::path::Path;

pub mod bench;
pub mod build;
pub mod export_delta;
pub mod inspect;
pub mod query;
pub mod query_batch;

/// Opens an index with the backend it was written with.
pub fn open_index(index_dir: &str) -> Result<Index> {
    crate::utils::validate_index_dir(index_dir)?;
    let dir = Path::new(index_dir);
    let manifest = IndexManifest::load(dir)
        .with_context(|| format!("Failed to load manifest from {index_dir}"))?;
    Index::open(dir, &StoreOptions::with_backend(manifest.backend))
        .with_context(|| format!("Failed to open index {index_dir}"))
}

pub fn parse_strategy(name: &str) -> Result<Strategy> {
    name.parse::<Strategy>()
        .with_context(|| format!("Invalid strategy '{name}'"))
}

/// Parses one `term<TAB>doc_id` line. Blank lines yield `None`.
pub fn parse_pair_line(line: &str, line_no: usize) -> Result<Option<(&str, DocId)>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let (term, doc) = line
        .rsplit_once('\t')
        .with_context(|| format!("Line {line_no}: expected 'term<TAB>doc_id'"))?;
    if term.is_empty() {
        anyhow::bail!("Line {line_no}: empty term");
    }
    let doc = doc
        .trim()
        .parse::<DocId>()
        .with_context(|| format!("Line {line_no}: invalid document id '{doc}'"))?;
    Ok(Some((term, doc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair_line() {
        assert_eq!(parse_pair_line("cat\t1", 1).unwrap(), Some(("cat", 1)));
        assert_eq!(parse_pair_line("cat\t42\r\n", 2).unwrap(), Some(("cat", 42)));
        assert_eq!(
            parse_pair_line("new york\t7", 3).unwrap(),
            Some(("new york", 7))
        );
        assert_eq!(parse_pair_line("   ", 4).unwrap(), None);
        assert!(parse_pair_line("cat 1", 5).is_err());
        assert!(parse_pair_line("cat\tone", 6).is_err());
        assert!(parse_pair_line("\t1", 7).is_err());
        assert!(parse_pair_line("cat\t-1", 8).is_err());
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(parse_strategy("gallop").unwrap(), Strategy::Gallop);
        assert!(parse_strategy("zipper").is_err());
    }
}
