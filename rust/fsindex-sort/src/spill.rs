//! Disk-spilling scratch store.
//!
//! Entries accumulate in memory until their total size crosses the memory
//! budget; the buffer is then sorted, deduplicated and written out as a run
//! file. Draining merges all runs (plus whatever is still buffered) through a
//! binary heap, dropping duplicates that landed in different runs.
//!
//! Run file layout: a sequence of `u32 LE length` + entry bytes.

use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use fsindex_common::{Result, error::Error};

use crate::{
    quicksort::{PivotSelector, quicksort},
    scratch::{EntryIter, OrderedScratchStore, scratch_dir},
};

/// Per-entry bookkeeping charged against the memory budget on top of the
/// entry bytes.
const ENTRY_OVERHEAD: usize = 24;

struct Run {
    path: PathBuf,
    entries: u64,
}

pub struct SpillScratchStore {
    dir: tempfile::TempDir,
    buffer: Vec<Vec<u8>>,
    buffered_bytes: usize,
    memory_budget: usize,
    pivot: PivotSelector,
    cutoff: usize,
    runs: Vec<Run>,
    inserted: u64,
}

impl SpillScratchStore {
    pub fn new(
        memory_budget: usize,
        pivot: PivotSelector,
        cutoff: usize,
        parent_dir: Option<&Path>,
    ) -> Result<SpillScratchStore> {
        Ok(SpillScratchStore {
            dir: scratch_dir(parent_dir)?,
            buffer: Vec::new(),
            buffered_bytes: 0,
            memory_budget: memory_budget.max(1),
            pivot,
            cutoff,
            runs: Vec::new(),
            inserted: 0,
        })
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn sort_buffer(&mut self) {
        quicksort(&mut self.buffer, self.pivot, self.cutoff);
        self.buffer.dedup();
    }

    fn spill(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sort_buffer();
        let path = self.dir.path().join(format!("run-{:05}", self.runs.len()));
        let element = path.display().to_string();
        let file = File::create(&path).map_err(|e| Error::io(element.clone(), e))?;
        let mut writer = BufWriter::new(file);
        for entry in &self.buffer {
            let len = u32::try_from(entry.len()).map_err(|_| {
                Error::invalid_arg("entry", format!("{} bytes is too long", entry.len()))
            })?;
            writer
                .write_all(&len.to_le_bytes())
                .and_then(|_| writer.write_all(entry))
                .map_err(|e| Error::io(element.clone(), e))?;
        }
        writer.flush().map_err(|e| Error::io(element, e))?;
        log::debug!(
            "spilled run {} ({} entries, {} bytes buffered)",
            self.runs.len(),
            self.buffer.len(),
            self.buffered_bytes
        );
        self.runs.push(Run {
            path,
            entries: self.buffer.len() as u64,
        });
        self.buffer.clear();
        self.buffered_bytes = 0;
        Ok(())
    }
}

impl OrderedScratchStore for SpillScratchStore {
    fn insert(&mut self, entry: Vec<u8>) -> Result<()> {
        self.buffered_bytes += entry.len() + ENTRY_OVERHEAD;
        self.buffer.push(entry);
        self.inserted += 1;
        if self.buffered_bytes >= self.memory_budget {
            self.spill()?;
        }
        Ok(())
    }

    fn len_hint(&self) -> u64 {
        self.inserted
    }

    fn drain(&mut self) -> Result<EntryIter<'_>> {
        if self.runs.is_empty() {
            self.sort_buffer();
            let entries = std::mem::take(&mut self.buffer);
            return Ok(Box::new(entries.into_iter().map(Ok)));
        }
        self.spill()?;
        let readers = self
            .runs
            .iter()
            .map(RunReader::open)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("merging {} spill runs", readers.len());
        Ok(Box::new(RunMerge::new(readers)?))
    }

    fn name(&self) -> &'static str {
        "spill"
    }
}

struct RunReader {
    reader: BufReader<File>,
    path: PathBuf,
    remaining: u64,
}

impl RunReader {
    fn open(run: &Run) -> Result<RunReader> {
        let file = File::open(&run.path).map_err(|e| Error::io(run.path.display().to_string(), e))?;
        Ok(RunReader {
            reader: BufReader::new(file),
            path: run.path.clone(),
            remaining: run.entries,
        })
    }

    fn next_entry(&mut self) -> Result<Option<Vec<u8>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let element = || self.path.display().to_string();
        let mut len = [0u8; 4];
        self.reader
            .read_exact(&mut len)
            .map_err(|e| Error::io(element(), e))?;
        let mut entry = vec![0u8; u32::from_le_bytes(len) as usize];
        self.reader
            .read_exact(&mut entry)
            .map_err(|e| Error::io(element(), e))?;
        self.remaining -= 1;
        Ok(Some(entry))
    }
}

/// K-way merge over sorted runs that collapses equal entries.
struct RunMerge {
    readers: Vec<RunReader>,
    heap: BinaryHeap<Reverse<(Vec<u8>, usize)>>,
    last: Option<Vec<u8>>,
    failed: bool,
}

impl RunMerge {
    fn new(mut readers: Vec<RunReader>) -> Result<RunMerge> {
        let mut heap = BinaryHeap::with_capacity(readers.len());
        for (i, reader) in readers.iter_mut().enumerate() {
            if let Some(entry) = reader.next_entry()? {
                heap.push(Reverse((entry, i)));
            }
        }
        Ok(RunMerge {
            readers,
            heap,
            last: None,
            failed: false,
        })
    }

    fn advance(&mut self) -> Result<Option<Vec<u8>>> {
        while let Some(Reverse((entry, i))) = self.heap.pop() {
            if let Some(next) = self.readers[i].next_entry()? {
                self.heap.push(Reverse((next, i)));
            }
            if self.last.as_ref() == Some(&entry) {
                continue;
            }
            self.last = Some(entry.clone());
            return Ok(Some(entry));
        }
        Ok(None)
    }
}

impl Iterator for RunMerge {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SpillScratchStore;
    use crate::{quicksort::PivotSelector, scratch::OrderedScratchStore};

    #[test]
    fn test_spill_merges_runs_and_dedups() {
        let mut store = SpillScratchStore::new(256, PivotSelector::Random, 4, None).unwrap();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut expected = std::collections::BTreeSet::new();
        for _ in 0..2000 {
            let entry = rng.u16(0..500).to_be_bytes().to_vec();
            expected.insert(entry.clone());
            store.insert(entry).unwrap();
        }
        assert!(store.run_count() > 1);
        assert_eq!(store.len_hint(), 2000);
        let drained = store.drain().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(drained, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_spill_without_runs_stays_in_memory() {
        let mut store =
            SpillScratchStore::new(1 << 20, PivotSelector::default(), 16, None).unwrap();
        for entry in [b"b".to_vec(), b"a".to_vec(), b"b".to_vec()] {
            store.insert(entry).unwrap();
        }
        assert_eq!(store.run_count(), 0);
        let drained = store.drain().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(drained, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
