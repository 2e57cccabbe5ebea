//! Build command implementation

use anyhow::{Context, Result};
use fsindex::{BuildOptions, IndexBuilder};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{commands::parse_pair_line, utils};

/// Run the build command
pub fn run(
    input: String,
    index_dir: String,
    config: Option<String>,
    backend: Option<String>,
    sorter: Option<String>,
    min_frequency: Option<usize>,
) -> Result<()> {
    utils::validate_file_exists(&input)?;
    let options = establish_options(config, backend, sorter, min_frequency)?;
    println!(
        "Building index {} from {} (backend {}, sorter {})",
        index_dir, input, options.store.backend, options.sorter.kind
    );

    let mut builder = IndexBuilder::new(Path::new(&index_dir), options)
        .with_context(|| format!("Failed to create index builder in {index_dir}"))?;

    let file = File::open(&input).with_context(|| format!("Failed to open {input}"))?;
    let reader = BufReader::new(file);
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {input}"))?;
        if let Some((term, doc)) = parse_pair_line(&line, i + 1)? {
            builder
                .add(term.as_bytes(), doc)
                .with_context(|| format!("Failed to add pair at line {}", i + 1))?;
        }
    }

    let (index, stats) = builder.finish().context("Failed to finish index")?;
    println!("Build completed:");
    println!("  pairs ingested:  {}", stats.pairs);
    println!("  terms:           {}", stats.terms);
    println!("  postings:        {}", stats.postings);
    println!("  terms dropped:   {}", stats.terms_dropped);
    println!("  elapsed:         {} ms", stats.elapsed_ms);
    println!("  index directory: {}", index.dir().display());
    Ok(())
}

fn establish_options(
    config: Option<String>,
    backend: Option<String>,
    sorter: Option<String>,
    min_frequency: Option<usize>,
) -> Result<BuildOptions> {
    let mut options = match config {
        Some(path) => {
            utils::validate_file_exists(&path)?;
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            serde_json::from_str::<BuildOptions>(&json)
                .with_context(|| format!("Failed to parse config file: {path}"))?
        }
        None => BuildOptions::default(),
    };
    if let Some(backend) = backend {
        options.store.backend = backend
            .parse()
            .with_context(|| format!("Invalid backend '{backend}'"))?;
    }
    if let Some(sorter) = sorter {
        options.sorter.kind = sorter
            .parse()
            .with_context(|| format!("Invalid sorter '{sorter}'"))?;
    }
    if let Some(min_frequency) = min_frequency {
        options.min_frequency = min_frequency;
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use fsindex_fsas::Backend;
    use fsindex_sort::SorterKind;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_establish_options_overrides() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(
            config,
            r#"{{"store": {{"backend": "file"}}, "sorter": {{"kind": "memory"}}, "min_frequency": 3}}"#
        )
        .unwrap();
        let path = config.path().to_str().unwrap().to_string();

        let options = establish_options(Some(path.clone()), None, None, None).unwrap();
        assert_eq!(options.store.backend, Backend::File);
        assert_eq!(options.sorter.kind, SorterKind::Memory);
        assert_eq!(options.min_frequency, 3);

        let options = establish_options(
            Some(path),
            Some("mmap".to_string()),
            Some("spill".to_string()),
            Some(0),
        )
        .unwrap();
        assert_eq!(options.store.backend, Backend::Mmap);
        assert_eq!(options.sorter.kind, SorterKind::Spill);
        assert_eq!(options.min_frequency, 0);

        assert!(establish_options(None, Some("lmdb".to_string()), None, None).is_err());
    }

    #[test]
    fn test_build_and_query() {
        let input = fsindex_testkit::data_gen::write_pairs_tsv(&[
            ("cat".to_string(), 1),
            ("dog".to_string(), 2),
            ("cat".to_string(), 3),
            ("dog".to_string(), 3),
        ])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("idx").to_str().unwrap().to_string();
        run(
            input.path().to_str().unwrap().to_string(),
            index_dir.clone(),
            None,
            None,
            Some("memory".to_string()),
            None,
        )
        .unwrap();

        let index = crate::commands::open_index(&index_dir).unwrap();
        assert_eq!(index.term_count(), 2);
        assert_eq!(index.query(&["cat", "dog"]).unwrap(), vec![3]);
    }
}
