//! Fixed-width dictionary records.
//!
//! The dictionary is an FSAS of [`DICTIONARY_RECORD_WIDTH`]-byte records, one
//! per term, in ascending term byte order. A record points at the term's bytes
//! in the terms store and at its posting list in the postings store:
//!
//! ```text
//! offset  size  field
//!      0     8  term_offset      (index of the first byte in terms.fsas)
//!      8     4  term_len
//!     12     4  reserved (zero)
//!     16     8  postings_offset  (index of the first id in postings.fsas)
//!     24     8  postings_len
//! ```
//!
//! All fields are little-endian.

use fsindex_common::{Result, verify_data};

pub const DICTIONARY_RECORD_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DictionaryEntry {
    pub term_offset: u64,
    pub term_len: u32,
    pub postings_offset: u64,
    pub postings_len: u64,
}

impl DictionaryEntry {
    pub fn encode(&self) -> [u8; DICTIONARY_RECORD_WIDTH] {
        let mut buf = [0u8; DICTIONARY_RECORD_WIDTH];
        buf[0..8].copy_from_slice(&self.term_offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.term_len.to_le_bytes());
        buf[16..24].copy_from_slice(&self.postings_offset.to_le_bytes());
        buf[24..32].copy_from_slice(&self.postings_len.to_le_bytes());
        buf
    }

    pub fn decode(record: &[u8]) -> Result<DictionaryEntry> {
        verify_data!(record, record.len() == DICTIONARY_RECORD_WIDTH);
        let u64_at = |pos: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&record[pos..pos + 8]);
            u64::from_le_bytes(b)
        };
        let mut term_len = [0u8; 4];
        term_len.copy_from_slice(&record[8..12]);
        Ok(DictionaryEntry {
            term_offset: u64_at(0),
            term_len: u32::from_le_bytes(term_len),
            postings_offset: u64_at(16),
            postings_len: u64_at(24),
        })
    }
}
