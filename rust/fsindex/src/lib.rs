//! Disk-resident inverted index.
//!
//! An index is a directory holding three fixed-size array stores and a
//! manifest:
//!
//! - `postings.fsas`: every posting list back to back, one little-endian
//!   `u64` document id per record;
//! - `terms.fsas`: term bytes back to back, one byte per record;
//! - `dictionary.fsas`: one [`DictionaryEntry`] per term, sorted by term;
//! - `manifest.json`: store widths and counts plus [`BuildStats`].
//!
//! [`IndexBuilder`] creates an index from an unordered stream of
//! (term, document id) pairs; [`Index`] opens it read-only and answers
//! conjunctive queries through the intersection engine.

use fsindex_fsas::StoreOptions;
use fsindex_sort::SorterOptions;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod dictionary;
pub mod index;
pub mod manifest;
pub mod postings;

pub use builder::{IndexBuilder, build};
pub use dictionary::DictionaryEntry;
pub use fsindex_common::DocId;
pub use index::Index;
pub use manifest::{BuildStats, IndexManifest};
pub use postings::PostingListView;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub store: StoreOptions,
    pub sorter: SorterOptions,
    /// Terms with fewer distinct documents than this are left out of the
    /// index. Zero keeps every term.
    pub min_frequency: usize,
}
