//! Gap-coded posting lists.
//!
//! Each list is written as the Elias delta code of `first + 1` followed by the
//! codes of the gaps `id[i] - id[i - 1]`. The bit offset and length of every
//! list are kept next to the bit stream, so any list decodes on its own.
//!
//! Serialized layout (little-endian):
//!
//! ```text
//! magic "FSDC" | version u32 | list_count u64 | bit_len u64
//! list_len u64 × list_count | bit_offset u64 × list_count | bit stream
//! ```

use fsindex_common::{Result, error::Error, verify_data};

use crate::{
    bits::{BitReader, BitWriter},
    elias::{read_delta, write_delta},
};

const MAGIC: &[u8; 4] = b"FSDC";
const VERSION: u32 = 1;
const PREFIX_SIZE: usize = 24;

#[derive(Debug, Default)]
pub struct DeltaPostingsEncoder {
    writer: BitWriter,
    list_lens: Vec<u64>,
    bit_offsets: Vec<u64>,
    ids: u64,
}

impl DeltaPostingsEncoder {
    pub fn new() -> DeltaPostingsEncoder {
        Default::default()
    }

    /// Appends one strictly increasing list.
    pub fn push_list(&mut self, ids: &[u64]) -> Result<()> {
        self.bit_offsets.push(self.writer.bit_len());
        self.list_lens.push(ids.len() as u64);
        let mut prev: Option<u64> = None;
        for &id in ids {
            let code = match prev {
                None => id.checked_add(1).ok_or_else(|| {
                    Error::invalid_arg("ids", format!("id {id} is too large to gap-code"))
                })?,
                Some(prev) if id > prev => id - prev,
                Some(prev) => {
                    return Err(Error::precond_violation(format!(
                        "list is not strictly increasing: {prev} followed by {id}"
                    )));
                }
            };
            write_delta(&mut self.writer, code)?;
            prev = Some(id);
        }
        self.ids += ids.len() as u64;
        Ok(())
    }

    pub fn finish(self) -> DeltaCodedPostings {
        let (bits, bit_len) = self.writer.finish();
        log::debug!(
            "delta-coded {} lists, {} ids into {} bytes",
            self.list_lens.len(),
            self.ids,
            bits.len()
        );
        DeltaCodedPostings {
            bits,
            bit_len,
            list_lens: self.list_lens,
            bit_offsets: self.bit_offsets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaCodedPostings {
    bits: Vec<u8>,
    bit_len: u64,
    list_lens: Vec<u64>,
    bit_offsets: Vec<u64>,
}

impl DeltaCodedPostings {
    pub fn list_count(&self) -> usize {
        self.list_lens.len()
    }

    pub fn list_len(&self, list: usize) -> Option<u64> {
        self.list_lens.get(list).copied()
    }

    /// Total number of ids across all lists.
    pub fn id_count(&self) -> u64 {
        self.list_lens.iter().sum()
    }

    /// Size of the coded bit stream in bytes.
    pub fn stream_size(&self) -> usize {
        self.bits.len()
    }

    pub fn decode_list(&self, list: usize) -> Result<Vec<u64>> {
        let (Some(&len), Some(&offset)) = (self.list_lens.get(list), self.bit_offsets.get(list))
        else {
            return Err(Error::out_of_range(list as u64, self.list_lens.len() as u64));
        };
        let mut reader = BitReader::new(&self.bits, self.bit_len)?;
        reader.seek(offset)?;
        // Every code takes at least one bit.
        let capacity = len.min(self.bit_len - offset) as usize;
        let mut ids: Vec<u64> = Vec::with_capacity(capacity);
        let mut prev: Option<u64> = None;
        for _ in 0..len {
            let code = read_delta(&mut reader)?;
            let id = match prev {
                None => code - 1,
                Some(prev) => prev
                    .checked_add(code)
                    .ok_or_else(|| Error::invalid_format("delta postings", "id overflow"))?,
            };
            ids.push(id);
            prev = Some(id);
        }
        Ok(ids)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(PREFIX_SIZE + self.list_lens.len() * 16 + self.bits.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.list_lens.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.bit_len.to_le_bytes());
        for len in &self.list_lens {
            buf.extend_from_slice(&len.to_le_bytes());
        }
        for offset in &self.bit_offsets {
            buf.extend_from_slice(&offset.to_le_bytes());
        }
        buf.extend_from_slice(&self.bits);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<DeltaCodedPostings> {
        verify_data!(prefix, bytes.len() >= PREFIX_SIZE);
        verify_data!(magic, &bytes[..4] == MAGIC);
        verify_data!(version, read_u32(bytes, 4) == VERSION);
        let count = read_u64(bytes, 8) as usize;
        let bit_len = read_u64(bytes, 16);
        let tables_end = count
            .checked_mul(16)
            .and_then(|n| n.checked_add(PREFIX_SIZE))
            .ok_or_else(|| Error::invalid_format("delta postings", "list count overflow"))?;
        verify_data!(tables, bytes.len() >= tables_end);
        let list_lens: Vec<u64> = (0..count).map(|i| read_u64(bytes, PREFIX_SIZE + i * 8)).collect();
        let bit_offsets: Vec<u64> = (0..count)
            .map(|i| read_u64(bytes, PREFIX_SIZE + (count + i) * 8))
            .collect();
        let bits = bytes[tables_end..].to_vec();
        verify_data!(bit_len, bit_len <= bits.len() as u64 * 8);
        verify_data!(bit_offsets, bit_offsets.iter().all(|&o| o <= bit_len));
        verify_data!(
            list_lens,
            list_lens
                .iter()
                .zip(&bit_offsets)
                .all(|(&len, &offset)| len <= bit_len - offset)
        );
        Ok(DeltaCodedPostings {
            bits,
            bit_len,
            list_lens,
            bit_offsets,
        })
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[pos..pos + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], pos: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[pos..pos + 8]);
    u64::from_le_bytes(buf)
}
