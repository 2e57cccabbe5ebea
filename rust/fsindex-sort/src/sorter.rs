use fsindex_common::{Result, error::Error, try_or_ret_some_err};

use crate::{
    SorterOptions, create_scratch_store,
    key::{decode_entry, encode_entry},
    scratch::{EntryIter, OrderedScratchStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ingest,
    Drained,
}

/// Groups (key, value) pairs by key through an ordered scratch store.
///
/// The sorter has two disjoint phases. During ingestion [`insert`](Self::insert)
/// accepts pairs in any order; [`finalize`](Self::finalize) switches to the
/// terminal drained phase and returns the pairs grouped by key in ascending
/// order. Inserting or finalizing again afterwards fails with
/// `IngestAfterDrain`.
pub struct ExternalSorter {
    store: Box<dyn OrderedScratchStore>,
    phase: Phase,
    inserted: u64,
}

impl ExternalSorter {
    pub fn new(store: Box<dyn OrderedScratchStore>) -> ExternalSorter {
        ExternalSorter {
            store,
            phase: Phase::Ingest,
            inserted: 0,
        }
    }

    pub fn with_options(options: &SorterOptions) -> Result<ExternalSorter> {
        Ok(ExternalSorter::new(create_scratch_store(options)?))
    }

    pub fn insert(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if self.phase == Phase::Drained {
            return Err(Error::ingest_after_drain());
        }
        self.store.insert(encode_entry(key, value))?;
        self.inserted += 1;
        Ok(())
    }

    /// Number of pairs inserted so far, duplicates included.
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn is_drained(&self) -> bool {
        self.phase == Phase::Drained
    }

    pub fn finalize(&mut self) -> Result<Groups<'_>> {
        if self.phase == Phase::Drained {
            return Err(Error::ingest_after_drain());
        }
        self.phase = Phase::Drained;
        log::debug!(
            "draining {} scratch store ({} inserts)",
            self.store.name(),
            self.store.len_hint()
        );
        Ok(Groups {
            entries: self.store.drain()?,
            pending: None,
        })
    }
}

/// One key and all distinct values inserted with it, in ascending byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

/// Drained groups, in ascending key order.
pub struct Groups<'a> {
    entries: EntryIter<'a>,
    /// First entry of the next group, read while closing the current one.
    pending: Option<(Vec<u8>, Option<Vec<u8>>)>,
}

impl Groups<'_> {
    fn next_decoded(&mut self) -> Option<Result<(Vec<u8>, Option<Vec<u8>>)>> {
        if let Some(entry) = self.pending.take() {
            return Some(Ok(entry));
        }
        let entry = try_or_ret_some_err!(self.entries.next()?);
        Some(decode_entry(&entry))
    }
}

impl Iterator for Groups<'_> {
    type Item = Result<Group>;

    fn next(&mut self) -> Option<Result<Group>> {
        let (key, value) = try_or_ret_some_err!(self.next_decoded()?);
        let mut group = Group {
            key,
            values: value.into_iter().collect(),
        };
        while let Some(next) = self.next_decoded() {
            let (key, value) = try_or_ret_some_err!(next);
            if key != group.key {
                self.pending = Some((key, value));
                break;
            }
            group.values.extend(value);
        }
        Some(Ok(group))
    }
}
