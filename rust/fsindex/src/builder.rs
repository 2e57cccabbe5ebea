//! Index construction.
//!
//! Pairs are pushed through the [`ExternalSorter`] with the term as key and
//! the big-endian document id as value, so the drained groups arrive in term
//! order with ids already ascending. Each group becomes one contiguous run in
//! `postings.fsas`, its term bytes go to `terms.fsas`, and a
//! [`DictionaryEntry`] pointing at both is appended to `dictionary.fsas`.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use fsindex_common::{DocId, Result, error::Error};
use fsindex_fsas::{FixedSizeArrayStore, StoreOptions};
use fsindex_sort::{ExternalSorter, Group};

use crate::{
    BuildOptions, Index,
    dictionary::{DICTIONARY_RECORD_WIDTH, DictionaryEntry},
    manifest::{
        BuildStats, DICTIONARY_FILE, IndexManifest, POSTINGS_FILE, SCHEMA_VERSION, StoreInfo,
        TERMS_FILE,
    },
    postings::{POSTING_RECORD_WIDTH, encode_ids},
};

pub struct IndexBuilder {
    dir: PathBuf,
    options: BuildOptions,
    sorter: ExternalSorter,
    started: Instant,
}

impl IndexBuilder {
    /// Starts a build into `dir`, which is created if needed and must not
    /// already hold an index.
    pub fn new(dir: &Path, options: BuildOptions) -> Result<IndexBuilder> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir.display().to_string(), e))?;
        for file in [POSTINGS_FILE, DICTIONARY_FILE, TERMS_FILE] {
            if dir.join(file).exists() {
                return Err(Error::invalid_arg(
                    "dir",
                    format!("{} already contains an index", dir.display()),
                ));
            }
        }
        let sorter = ExternalSorter::with_options(&options.sorter)?;
        log::info!(
            "building index in {} ({} sorter, {} store)",
            dir.display(),
            options.sorter.kind,
            options.store.backend
        );
        Ok(IndexBuilder {
            dir: dir.to_path_buf(),
            options,
            sorter,
            started: Instant::now(),
        })
    }

    pub fn add(&mut self, term: &[u8], doc: DocId) -> Result<()> {
        self.sorter.insert(term, Some(&doc.to_be_bytes()[..]))
    }

    pub fn add_pairs<I, T>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (T, DocId)>,
        T: AsRef<[u8]>,
    {
        for (term, doc) in pairs {
            self.add(term.as_ref(), doc)?;
        }
        Ok(())
    }

    pub fn pairs(&self) -> u64 {
        self.sorter.inserted()
    }

    /// Drains the sorter, writes the stores and the manifest, and reopens the
    /// result read-only.
    pub fn finish(mut self) -> Result<(Index, BuildStats)> {
        let pairs = self.sorter.inserted();
        log::info!("ingested {pairs} pairs in {:.2?}", self.started.elapsed());

        let commit_started = Instant::now();
        let store_options = &self.options.store;
        let mut stores = Stores::create(&self.dir, store_options)?;
        let mut stats = BuildStats {
            pairs,
            ..Default::default()
        };
        let mut ids: Vec<DocId> = Vec::new();
        let mut buf: Vec<u8> = Vec::new();
        for group in self.sorter.finalize()? {
            let Group { key, values } = group?;
            decode_group(&key, &values, &mut ids)?;
            if ids.len() < self.options.min_frequency {
                stats.terms_dropped += 1;
                continue;
            }
            buf.clear();
            encode_ids(&ids, &mut buf);
            stores.commit(&key, &buf, ids.len() as u64)?;
            stats.terms += 1;
            stats.postings += ids.len() as u64;
        }
        log::info!(
            "committed {} terms, {} postings ({} terms below min frequency) in {:.2?}",
            stats.terms,
            stats.postings,
            stats.terms_dropped,
            commit_started.elapsed()
        );

        let persist_started = Instant::now();
        let manifest = stores.close(store_options, &stats)?;
        stats.elapsed_ms = self.started.elapsed().as_millis() as u64;
        let manifest = IndexManifest {
            stats: stats.clone(),
            ..manifest
        };
        manifest.save(&self.dir)?;
        log::info!(
            "persisted index in {:.2?}, total {} ms",
            persist_started.elapsed(),
            stats.elapsed_ms
        );

        let index = Index::open(&self.dir, store_options)?;
        Ok((index, stats))
    }
}

/// Builds an index from `pairs` in one call.
pub fn build<I, T>(dir: &Path, pairs: I, options: BuildOptions) -> Result<(Index, BuildStats)>
where
    I: IntoIterator<Item = (T, DocId)>,
    T: AsRef<[u8]>,
{
    let mut builder = IndexBuilder::new(dir, options)?;
    builder.add_pairs(pairs)?;
    builder.finish()
}

/// Decodes a drained group into `ids`, deduplicated and strictly increasing.
///
/// Panics if the ids are not strictly increasing after deduplication, which
/// means the sorter returned values out of order.
fn decode_group(term: &[u8], values: &[Vec<u8>], ids: &mut Vec<DocId>) -> Result<()> {
    ids.clear();
    for value in values {
        let bytes: [u8; 8] = value.as_slice().try_into().map_err(|_| {
            Error::invalid_format("scratch value", format!("{} bytes, expected 8", value.len()))
        })?;
        ids.push(DocId::from_be_bytes(bytes));
    }
    ids.dedup();
    assert!(
        ids.windows(2).all(|w| w[0] < w[1]),
        "posting list for term {:?} is not strictly increasing",
        String::from_utf8_lossy(term)
    );
    Ok(())
}

/// The three stores of an index under construction.
struct Stores {
    dir: PathBuf,
    postings: Box<dyn FixedSizeArrayStore>,
    dictionary: Box<dyn FixedSizeArrayStore>,
    terms: Box<dyn FixedSizeArrayStore>,
}

impl Stores {
    fn create(dir: &Path, options: &StoreOptions) -> Result<Stores> {
        Ok(Stores {
            dir: dir.to_path_buf(),
            postings: fsindex_fsas::create(
                &dir.join(POSTINGS_FILE),
                POSTING_RECORD_WIDTH,
                options,
            )?,
            dictionary: fsindex_fsas::create(
                &dir.join(DICTIONARY_FILE),
                DICTIONARY_RECORD_WIDTH,
                options,
            )?,
            terms: fsindex_fsas::create(&dir.join(TERMS_FILE), 1, options)?,
        })
    }

    fn commit(&mut self, term: &[u8], postings: &[u8], count: u64) -> Result<()> {
        let term_len = u32::try_from(term.len()).map_err(|_| {
            Error::invalid_arg("term", format!("{} bytes is too long", term.len()))
        })?;
        let entry = DictionaryEntry {
            term_offset: self.terms.append_many(term)?,
            term_len,
            postings_offset: self.postings.append_many(postings)?,
            postings_len: count,
        };
        self.dictionary.append(&entry.encode())?;
        Ok(())
    }

    fn close(self, options: &StoreOptions, stats: &BuildStats) -> Result<IndexManifest> {
        let info = |file: &str, store: &dyn FixedSizeArrayStore| StoreInfo {
            file: file.to_string(),
            width: store.width() as u32,
            len: store.len(),
        };
        let manifest = IndexManifest {
            schema_version: SCHEMA_VERSION,
            backend: options.backend,
            postings: info(POSTINGS_FILE, self.postings.as_ref()),
            dictionary: info(DICTIONARY_FILE, self.dictionary.as_ref()),
            terms: info(TERMS_FILE, self.terms.as_ref()),
            stats: stats.clone(),
        };
        self.postings.close()?;
        self.dictionary.close()?;
        self.terms.close()?;
        log::debug!("closed stores in {}", self.dir.display());
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::decode_group;

    fn values(ids: &[u64]) -> Vec<Vec<u8>> {
        ids.iter().map(|id| id.to_be_bytes().to_vec()).collect()
    }

    #[test]
    fn test_decode_group_dedups() {
        let mut ids = Vec::new();
        decode_group(b"cat", &values(&[1, 5, 5]), &mut ids).unwrap();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_decode_group_rejects_bad_width() {
        let mut ids = Vec::new();
        assert!(decode_group(b"cat", &[vec![1, 2, 3]], &mut ids).is_err());
    }

    #[test]
    #[should_panic(expected = "not strictly increasing")]
    fn test_decode_group_panics_on_disorder() {
        let mut ids = Vec::new();
        let _ = decode_group(b"cat", &values(&[5, 1]), &mut ids);
    }
}
