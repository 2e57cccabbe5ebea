//! Read-only access to a built index: dictionary lookup, posting list reads
//! and conjunctive queries.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use fsindex_common::{DocId, Result, error::Error};
use fsindex_encodings::{DeltaCodedPostings, DeltaPostingsEncoder};
use fsindex_fsas::{FixedSizeArrayStore, StoreOptions};
use fsindex_intersect::{IntersectOptions, Intersector, Strategy};

use crate::{
    dictionary::{DICTIONARY_RECORD_WIDTH, DictionaryEntry},
    manifest::{IndexManifest, StoreInfo},
    postings::{LazyPostings, POSTING_RECORD_WIDTH, PostingListView, encode_ids},
};

/// A built index, opened read-only.
///
/// `Index` is `Send + Sync`; any number of threads may query one instance
/// concurrently through a shared reference.
pub struct Index {
    dir: PathBuf,
    manifest: IndexManifest,
    store_options: StoreOptions,
    postings: Box<dyn FixedSizeArrayStore>,
    dictionary: Box<dyn FixedSizeArrayStore>,
    terms: Box<dyn FixedSizeArrayStore>,
    intersector: Intersector,
    posting_reads: AtomicU64,
}

impl Index {
    /// Opens the index in `dir`. Every store must match the record width and
    /// count recorded in the manifest.
    pub fn open(dir: &Path, options: &StoreOptions) -> Result<Index> {
        let manifest = IndexManifest::load(dir)?;
        let open_store = |info: &StoreInfo, width: usize| -> Result<Box<dyn FixedSizeArrayStore>> {
            let path = dir.join(&info.file);
            if info.width as usize != width {
                return Err(Error::schema_mismatch(
                    path.display().to_string(),
                    format!("manifest declares width {}, expected {width}", info.width),
                ));
            }
            let store = fsindex_fsas::open_with_width(&path, width, options)?;
            if store.len() != info.len {
                return Err(Error::schema_mismatch(
                    path.display().to_string(),
                    format!("{} records, manifest declares {}", store.len(), info.len),
                ));
            }
            Ok(store)
        };
        let postings = open_store(&manifest.postings, POSTING_RECORD_WIDTH)?;
        let dictionary = open_store(&manifest.dictionary, DICTIONARY_RECORD_WIDTH)?;
        let terms = open_store(&manifest.terms, 1)?;
        log::debug!(
            "opened index {} ({} terms, {} postings, {} backend)",
            dir.display(),
            dictionary.len(),
            postings.len(),
            options.backend
        );
        Ok(Index {
            dir: dir.to_path_buf(),
            manifest,
            store_options: options.clone(),
            postings,
            dictionary,
            terms,
            intersector: Intersector::default(),
            posting_reads: AtomicU64::new(0),
        })
    }

    pub fn with_intersect_options(mut self, options: IntersectOptions) -> Index {
        self.intersector = Intersector::new(options);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn term_count(&self) -> u64 {
        self.dictionary.len()
    }

    pub fn posting_count(&self) -> u64 {
        self.postings.len()
    }

    /// Number of posting lists read so far by this instance.
    pub fn posting_reads(&self) -> u64 {
        self.posting_reads.load(Ordering::Relaxed)
    }

    /// The dictionary entry at position `index` (terms are in ascending order).
    pub fn entry(&self, index: u64) -> Result<DictionaryEntry> {
        DictionaryEntry::decode(&self.dictionary.read(index)?)
    }

    pub fn term(&self, entry: &DictionaryEntry) -> Result<Cow<'_, [u8]>> {
        self.terms.read_range(entry.term_offset, entry.term_len as u64)
    }

    /// Finds the dictionary entry of `term` by binary search.
    pub fn lookup(&self, term: &[u8]) -> Result<Option<DictionaryEntry>> {
        let mut lo = 0;
        let mut hi = self.term_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entry(mid)?;
            match self.term(&entry)?.as_ref().cmp(term) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(Some(entry)),
            }
        }
        Ok(None)
    }

    pub fn postings(&self, entry: &DictionaryEntry) -> Result<PostingListView<'_>> {
        self.posting_reads.fetch_add(1, Ordering::Relaxed);
        let bytes = self
            .postings
            .read_range(entry.postings_offset, entry.postings_len)?;
        Ok(PostingListView::from_bytes(bytes))
    }

    /// Iterates over all terms and their entries, in ascending term order.
    pub fn terms(&self) -> impl Iterator<Item = Result<(Vec<u8>, DictionaryEntry)>> + '_ {
        (0..self.term_count()).map(move |i| {
            let entry = self.entry(i)?;
            Ok((self.term(&entry)?.into_owned(), entry))
        })
    }

    /// Documents containing every term in `terms`.
    pub fn query<T: AsRef<[u8]>>(&self, terms: &[T]) -> Result<Vec<DocId>> {
        self.query_with(terms, Strategy::Adaptive)
    }

    /// Like [`query`](Self::query), with an explicit intersection strategy.
    ///
    /// Repeated terms count once. A term missing from the dictionary makes
    /// the result empty, and so does an empty term list.
    pub fn query_with<T: AsRef<[u8]>>(
        &self,
        terms: &[T],
        strategy: Strategy,
    ) -> Result<Vec<DocId>> {
        let mut unique: Vec<&[u8]> = terms.iter().map(|t| t.as_ref()).collect();
        unique.sort_unstable();
        unique.dedup();

        let mut lists = Vec::with_capacity(unique.len());
        for term in unique {
            match self.lookup(term)? {
                Some(entry) => lists.push(LazyPostings { index: self, entry }),
                None => {
                    log::debug!(
                        "query term {:?} not in dictionary",
                        String::from_utf8_lossy(term)
                    );
                    return Ok(Vec::new());
                }
            }
        }
        self.intersector.intersect(&lists, strategy)
    }

    /// Runs a query and writes the result into a new store of document ids at
    /// `path`. Returns the number of ids written.
    pub fn query_to_store<T: AsRef<[u8]>>(
        &self,
        terms: &[T],
        strategy: Strategy,
        path: &Path,
    ) -> Result<u64> {
        let ids = self.query_with(terms, strategy)?;
        let mut store = fsindex_fsas::create(
            path,
            POSTING_RECORD_WIDTH,
            &StoreOptions {
                capacity_hint: ids.len() as u64,
                ..self.store_options.clone()
            },
        )?;
        if !store.is_empty() {
            return Err(Error::invalid_arg(
                "path",
                format!("{} already holds {} records", path.display(), store.len()),
            ));
        }
        let mut buf = Vec::new();
        encode_ids(&ids, &mut buf);
        store.append_many(&buf)?;
        store.close()?;
        Ok(ids.len() as u64)
    }

    /// Gap-codes every posting list with the Elias delta code, in dictionary
    /// order.
    pub fn export_delta(&self) -> Result<DeltaCodedPostings> {
        let mut encoder = DeltaPostingsEncoder::new();
        for i in 0..self.term_count() {
            let entry = self.entry(i)?;
            encoder.push_list(&self.postings(&entry)?)?;
        }
        Ok(encoder.finish())
    }
}
