//! LSM-backed scratch store on top of `fjall`.
//!
//! Entries are stored as keys with empty values in a keyspace inside a private
//! temporary database; the LSM tree keeps them ordered and deduplicated, and
//! a forward scan drains them. The database directory is removed when the
//! store is dropped.
//!
//! Keys are limited in size, so an entry longer than [`MAX_KEY_LEN`] is keyed
//! by its first `MAX_KEY_LEN` bytes plus the insert sequence number and keeps
//! its full bytes in the value. Such keys sort after every shorter entry they
//! extend and before any entry that differs within the prefix, so long entries
//! sharing a prefix come out as one contiguous run, which the drain sorts and
//! deduplicates in memory.

use std::{iter::Peekable, path::Path};

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use fsindex_common::{Result, error::Error};

use crate::scratch::{EntryIter, OrderedScratchStore, scratch_dir};

const KEYSPACE: &str = "scratch";

/// Longest entry stored directly as a key.
const MAX_KEY_LEN: usize = 4096;

pub struct FjallScratchStore {
    keyspace: Keyspace,
    _db: Database,
    // Dropped last: the database files live inside.
    _dir: tempfile::TempDir,
    inserted: u64,
}

impl FjallScratchStore {
    pub fn new(parent_dir: Option<&Path>) -> Result<FjallScratchStore> {
        let dir = scratch_dir(parent_dir)?;
        let db = Database::builder(dir.path())
            .open()
            .map_err(|e| Error::scratch("open database", e))?;
        let keyspace = db
            .keyspace(KEYSPACE, KeyspaceCreateOptions::default)
            .map_err(|e| Error::scratch("open keyspace", e))?;
        log::debug!("opened fjall scratch store in {}", dir.path().display());
        Ok(FjallScratchStore {
            keyspace,
            _db: db,
            _dir: dir,
            inserted: 0,
        })
    }
}

impl OrderedScratchStore for FjallScratchStore {
    fn insert(&mut self, entry: Vec<u8>) -> Result<()> {
        let result = if entry.len() > MAX_KEY_LEN {
            let mut key = Vec::with_capacity(MAX_KEY_LEN + 8);
            key.extend_from_slice(&entry[..MAX_KEY_LEN]);
            key.extend_from_slice(&self.inserted.to_be_bytes());
            self.keyspace.insert(key, entry)
        } else {
            self.keyspace.insert(entry, Vec::<u8>::new())
        };
        result.map_err(|e| Error::scratch("insert", e))?;
        self.inserted += 1;
        Ok(())
    }

    fn len_hint(&self) -> u64 {
        self.inserted
    }

    fn drain(&mut self) -> Result<EntryIter<'_>> {
        let iter = self.keyspace.iter().map(|guard| {
            let (key, value) = guard
                .into_inner()
                .map_err(|e| Error::scratch("scan", e))?;
            if key.len() > MAX_KEY_LEN {
                Ok(ScanItem::Long(value.as_ref().to_vec()))
            } else {
                Ok(ScanItem::Direct(key.as_ref().to_vec()))
            }
        });
        Ok(Box::new(LongEntryRuns {
            inner: iter.peekable(),
            pending: Vec::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "fjall"
    }
}

enum ScanItem {
    Direct(Vec<u8>),
    Long(Vec<u8>),
}

/// Restores byte order and uniqueness within runs of long entries.
struct LongEntryRuns<I: Iterator<Item = Result<ScanItem>>> {
    inner: Peekable<I>,
    /// Sorted, deduplicated run, in reverse so that `pop` yields ascending.
    pending: Vec<Vec<u8>>,
}

impl<I: Iterator<Item = Result<ScanItem>>> Iterator for LongEntryRuns<I> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.pending.pop() {
            return Some(Ok(entry));
        }
        let first = match self.inner.next()? {
            Ok(ScanItem::Direct(entry)) => return Some(Ok(entry)),
            Ok(ScanItem::Long(entry)) => entry,
            Err(e) => return Some(Err(e)),
        };
        let mut run = vec![first];
        while let Some(Ok(ScanItem::Long(next))) = self.inner.peek() {
            if next.get(..MAX_KEY_LEN) != run[0].get(..MAX_KEY_LEN) {
                break;
            }
            if let Some(Ok(ScanItem::Long(next))) = self.inner.next() {
                run.push(next);
            }
        }
        run.sort_unstable();
        run.dedup();
        run.reverse();
        self.pending = run;
        self.pending.pop().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use crate::scratch::OrderedScratchStore;

    use super::{FjallScratchStore, MAX_KEY_LEN};

    #[test]
    fn test_long_entries_sorted_and_deduplicated() {
        let prefix = vec![7u8; MAX_KEY_LEN];
        let long = |tail: &[u8]| {
            let mut entry = prefix.clone();
            entry.extend_from_slice(tail);
            entry
        };
        let mut store = FjallScratchStore::new(None).unwrap();
        store.insert(long(b"zz")).unwrap();
        store.insert(vec![7u8; 10]).unwrap();
        store.insert(long(b"a")).unwrap();
        store.insert(prefix.clone()).unwrap();
        store.insert(long(b"zz")).unwrap();
        store.insert(vec![8u8]).unwrap();
        store.insert(long(b"\x00")).unwrap();
        assert_eq!(store.len_hint(), 7);

        let drained: Vec<Vec<u8>> = store
            .drain()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let mut expected = vec![
            vec![7u8; 10],
            prefix.clone(),
            long(b"\x00"),
            long(b"a"),
            long(b"zz"),
            vec![8u8],
        ];
        expected.sort();
        assert_eq!(drained, expected);
    }
}
