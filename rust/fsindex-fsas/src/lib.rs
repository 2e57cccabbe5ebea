//! Fixed-Size Array Store (FSAS): a disk-backed, append-only array of uniformly
//! sized records with O(1) positional access.
//!
//! A store is a single file: a 64-byte [`header::StoreHeader`] followed by
//! `len × width` record bytes, so the address of record `i` is
//! `HEADER_SIZE + i × width`. The record width is fixed when the store is
//! created and checked every time it is reopened.
//!
//! The capability is expressed by the [`FixedSizeArrayStore`] trait. Two
//! interchangeable backends implement it:
//!
//! - [`mmap_store::MmapStore`] (`Backend::Mmap`): the file is memory-mapped,
//!   reads hand out borrowed slices of the mapping.
//! - [`file_store::FileStore`] (`Backend::File`): positional reads and writes on
//!   a plain file handle with a small append buffer; reads return owned copies.
//!
//! Both backends produce the same on-disk format. The backend is picked at
//! configuration time through [`StoreOptions`] and the [`create`] / [`open`]
//! factory functions; callers only ever hold a `Box<dyn FixedSizeArrayStore>`.

use std::{borrow::Cow, fmt, path::Path, str::FromStr};

use fsindex_common::{Result, error::Error, verify_arg};
use serde::{Deserialize, Serialize};

pub mod file_store;
pub mod header;
pub(crate) mod io;
pub mod mmap_store;


pub use file_store::FileStore;
pub use header::{HEADER_SIZE, StoreHeader};
pub use mmap_store::MmapStore;

/// Disk-backed array of fixed-width records.
///
/// Records are addressed by a zero-based `u64` index. The store only grows:
/// there is no deletion and no in-place rewrite of committed records.
///
/// Readers take `&self` and may run concurrently from multiple threads once
/// construction is complete; appends require exclusive access.
pub trait FixedSizeArrayStore: Send + Sync {
    /// Width of every record, in bytes.
    fn width(&self) -> usize;

    /// Number of records currently in the store.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a single record and returns its index.
    ///
    /// `record` must be exactly [`width`](Self::width) bytes long.
    fn append(&mut self, record: &[u8]) -> Result<u64> {
        if record.len() != self.width() {
            return Err(Error::invalid_arg(
                "record",
                format!("{} bytes, store width is {}", record.len(), self.width()),
            ));
        }
        self.append_many(record)
    }

    /// Appends a contiguous run of whole records and returns the index of the
    /// first one. An empty `records` slice is a no-op returning `len()`.
    fn append_many(&mut self, records: &[u8]) -> Result<u64>;

    /// Reads the record at `index`.
    fn read(&self, index: u64) -> Result<Cow<'_, [u8]>>;

    /// Reads `count` consecutive records starting at `start`, as one contiguous
    /// byte slice of `count × width` bytes.
    fn read_range(&self, start: u64, count: u64) -> Result<Cow<'_, [u8]>>;

    /// Makes all appended records and the record count durable.
    fn flush(&mut self) -> Result<()>;

    /// Flushes and releases the store, trimming any preallocated tail.
    fn close(self: Box<Self>) -> Result<()>;

    /// The backend implementing this store.
    fn backend(&self) -> Backend;

    /// Whether the store accepts appends.
    fn is_writable(&self) -> bool;
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Memory-mapped file.
    #[default]
    Mmap,
    /// Positional reads/writes on a file handle.
    File,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Mmap, Backend::File];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Mmap => "mmap",
            Backend::File => "file",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Backend> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_arg("backend", format!("unknown backend '{s}'")))
    }
}

/// Options controlling how stores are created and opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub backend: Backend,
    /// Number of records to preallocate when a new store is created.
    pub capacity_hint: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            backend: Backend::default(),
            capacity_hint: 1024,
        }
    }
}

impl StoreOptions {
    pub fn with_backend(backend: Backend) -> StoreOptions {
        StoreOptions {
            backend,
            ..Default::default()
        }
    }
}

/// Creates a writable store at `path`.
///
/// If the file already exists it is opened for appending, provided its record
/// width equals `width`; otherwise the call fails with `SchemaMismatch`.
pub fn create(
    path: &Path,
    width: usize,
    options: &StoreOptions,
) -> Result<Box<dyn FixedSizeArrayStore>> {
    verify_arg!(width, width > 0 && width <= u32::MAX as usize);
    let store: Box<dyn FixedSizeArrayStore> = match options.backend {
        Backend::Mmap => Box::new(MmapStore::create(path, width, options.capacity_hint)?),
        Backend::File => Box::new(FileStore::create(path, width, options.capacity_hint)?),
    };
    Ok(store)
}

/// Opens an existing store read-only.
pub fn open(path: &Path, options: &StoreOptions) -> Result<Box<dyn FixedSizeArrayStore>> {
    let store: Box<dyn FixedSizeArrayStore> = match options.backend {
        Backend::Mmap => Box::new(MmapStore::open(path)?),
        Backend::File => Box::new(FileStore::open(path)?),
    };
    Ok(store)
}

/// Opens an existing store read-only and checks its record width.
pub fn open_with_width(
    path: &Path,
    width: usize,
    options: &StoreOptions,
) -> Result<Box<dyn FixedSizeArrayStore>> {
    let store = open(path, options)?;
    if store.width() != width {
        return Err(Error::schema_mismatch(
            path.display().to_string(),
            format!("record width {}, expected {width}", store.width()),
        ));
    }
    Ok(store)
}

/// Validates `start..start + count` against a store of `len` records.
#[inline]
pub(crate) fn check_range(start: u64, count: u64, len: u64) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::out_of_range(start.saturating_add(count).saturating_sub(1).max(start), len)),
    }
}

#[inline]
pub(crate) fn check_index(index: u64, len: u64) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::out_of_range(index, len))
    }
}

#[inline]
pub(crate) fn check_whole_records(records: &[u8], width: usize) -> Result<u64> {
    verify_arg!(records, records.len() % width == 0);
    Ok((records.len() / width) as u64)
}
