//! External Sorter: turns an unordered stream of (key, value) pairs into
//! key-grouped output in ascending key order, with memory use bounded by the
//! chosen [`scratch::OrderedScratchStore`].
//!
//! Each pair is flattened by [`key::encode_entry`] into one byte string whose
//! byte order is (key, value) order, so the only thing a scratch store has to
//! provide is an ordered, deduplicating set of byte strings. Three stores are
//! available:
//!
//! - [`memory::MemoryScratchStore`]: a `BTreeSet`, for small inputs and tests.
//! - [`spill::SpillScratchStore`]: sorted runs in temporary files, merged at
//!   drain time.
//! - [`fjall_store::FjallScratchStore`]: a disk-backed LSM tree.

use std::{fmt, path::PathBuf, str::FromStr};

use fsindex_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

pub mod fjall_store;
pub mod key;
pub mod memory;
pub mod quicksort;
pub mod scratch;
pub mod sorter;
pub mod spill;

#[cfg(test)]
mod tests;

pub use quicksort::PivotSelector;
pub use scratch::OrderedScratchStore;
pub use sorter::{ExternalSorter, Group, Groups};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SorterKind {
    Memory,
    Spill,
    #[default]
    Fjall,
}

impl SorterKind {
    pub const ALL: [SorterKind; 3] = [SorterKind::Memory, SorterKind::Spill, SorterKind::Fjall];

    pub fn name(&self) -> &'static str {
        match self {
            SorterKind::Memory => "memory",
            SorterKind::Spill => "spill",
            SorterKind::Fjall => "fjall",
        }
    }
}

impl fmt::Display for SorterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SorterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<SorterKind> {
        SorterKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_arg("sorter", format!("unknown sorter '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterOptions {
    pub kind: SorterKind,
    /// Bytes of buffered entries after which the spill store writes a run.
    pub memory_budget: usize,
    pub pivot: PivotSelector,
    /// Sub-ranges of at most this many entries use the standard library sort.
    pub cutoff: usize,
    /// Parent directory for scratch files; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SorterOptions {
    fn default() -> Self {
        SorterOptions {
            kind: SorterKind::default(),
            memory_budget: 64 * 1024 * 1024,
            pivot: PivotSelector::default(),
            cutoff: 16,
            scratch_dir: None,
        }
    }
}

impl SorterOptions {
    pub fn with_kind(kind: SorterKind) -> SorterOptions {
        SorterOptions {
            kind,
            ..Default::default()
        }
    }
}

pub fn create_scratch_store(options: &SorterOptions) -> Result<Box<dyn OrderedScratchStore>> {
    let scratch_dir = options.scratch_dir.as_deref();
    let store: Box<dyn OrderedScratchStore> = match options.kind {
        SorterKind::Memory => Box::new(memory::MemoryScratchStore::new()),
        SorterKind::Spill => Box::new(spill::SpillScratchStore::new(
            options.memory_budget,
            options.pivot,
            options.cutoff,
            scratch_dir,
        )?),
        SorterKind::Fjall => Box::new(fjall_store::FjallScratchStore::new(scratch_dir)?),
    };
    log::debug!("created {} scratch store", store.name());
    Ok(store)
}
