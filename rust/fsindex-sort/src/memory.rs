//! In-memory scratch store, for small inputs and tests.

use std::collections::BTreeSet;

use fsindex_common::Result;

use crate::scratch::{EntryIter, OrderedScratchStore};

#[derive(Default)]
pub struct MemoryScratchStore {
    entries: BTreeSet<Vec<u8>>,
    inserted: u64,
}

impl MemoryScratchStore {
    pub fn new() -> MemoryScratchStore {
        Default::default()
    }
}

impl OrderedScratchStore for MemoryScratchStore {
    fn insert(&mut self, entry: Vec<u8>) -> Result<()> {
        self.entries.insert(entry);
        self.inserted += 1;
        Ok(())
    }

    fn len_hint(&self) -> u64 {
        self.inserted
    }

    fn drain(&mut self) -> Result<EntryIter<'_>> {
        let entries = std::mem::take(&mut self.entries);
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
