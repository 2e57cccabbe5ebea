//! The ordered scratch store abstraction underneath the external sorter.

use std::path::Path;

use fsindex_common::{Result, error::Error};

/// Iterator over drained scratch entries, in ascending byte order.
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<Vec<u8>>> + 'a>;

/// A set of byte strings that can be bulk-loaded and then read back once in
/// ascending byte-wise order, with duplicates collapsed.
pub trait OrderedScratchStore: Send {
    fn insert(&mut self, entry: Vec<u8>) -> Result<()>;

    /// Number of inserts so far; duplicates are counted.
    fn len_hint(&self) -> u64;

    /// Yields every distinct entry in ascending order. Called at most once.
    fn drain(&mut self) -> Result<EntryIter<'_>>;

    /// Short identifier used in log lines.
    fn name(&self) -> &'static str;
}

/// Creates the private temporary directory a disk-backed scratch store works
/// in, under `parent` when given.
pub(crate) fn scratch_dir(parent: Option<&Path>) -> Result<tempfile::TempDir> {
    let dir = match parent {
        Some(parent) => tempfile::tempdir_in(parent),
        None => tempfile::tempdir(),
    };
    dir.map_err(|e| Error::io("scratch directory", e))
}
