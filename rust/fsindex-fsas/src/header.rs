//! Fixed 64-byte header at the start of every store file.
//!
//! Layout (little-endian):
//!
//! | offset | size | field    |
//! |--------|------|----------|
//! | 0      | 4    | magic    |
//! | 4      | 4    | version  |
//! | 8      | 4    | width    |
//! | 12     | 4    | reserved |
//! | 16     | 8    | len      |
//! | 24     | 40   | reserved |

use std::{fs::File, path::Path};

use fsindex_common::{Result, error::Error};

use crate::io::{file_read_at_exact, file_write_at};

pub const MAGIC: [u8; 4] = *b"FSAS";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHeader {
    pub width: u32,
    pub len: u64,
}

impl StoreHeader {
    pub fn new(width: usize) -> StoreHeader {
        StoreHeader {
            width: width as u32,
            len: 0,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&self.width.to_le_bytes());
        buf[16..24].copy_from_slice(&self.len.to_le_bytes());
        buf
    }

    /// Parses and validates a header. `element` names the store in error messages.
    pub fn decode(buf: &[u8], element: &str) -> Result<StoreHeader> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::schema_mismatch(
                element,
                format!("header is {} bytes, expected {HEADER_SIZE}", buf.len()),
            ));
        }
        if buf[0..4] != MAGIC {
            return Err(Error::schema_mismatch(element, "bad magic"));
        }
        let version = read_u32(&buf[4..8]);
        if version != VERSION {
            return Err(Error::schema_mismatch(
                element,
                format!("version {version}, expected {VERSION}"),
            ));
        }
        let width = read_u32(&buf[8..12]);
        if width == 0 {
            return Err(Error::invalid_format(element, "zero record width"));
        }
        let len = read_u64(&buf[16..24]);
        Ok(StoreHeader { width, len })
    }

    pub fn read_from(file: &File, path: &Path) -> Result<StoreHeader> {
        let element = path.display().to_string();
        let file_len = file
            .metadata()
            .map_err(|e| Error::io(element.clone(), e))?
            .len();
        if file_len < HEADER_SIZE as u64 {
            return Err(Error::schema_mismatch(
                element,
                format!("file is {file_len} bytes, too short for a header"),
            ));
        }
        let mut buf = [0u8; HEADER_SIZE];
        file_read_at_exact(file, 0, &mut buf).map_err(|e| Error::io(element.clone(), e))?;
        let header = StoreHeader::decode(&buf, &element)?;
        let required = header.data_end().ok_or_else(|| {
            Error::invalid_format(
                element.clone(),
                format!("{} records of {} bytes overflow the file size", header.len, header.width),
            )
        })?;
        if file_len < required {
            return Err(Error::invalid_format(
                element,
                format!("truncated: {file_len} bytes, header requires {required}"),
            ));
        }
        Ok(header)
    }

    pub fn write_to(&self, file: &File, path: &Path) -> Result<()> {
        file_write_at(file, 0, &self.encode()).map_err(|e| Error::io(path.display().to_string(), e))
    }

    /// Byte offset just past the last record, `None` if it does not fit in a `u64`.
    pub fn data_end(&self) -> Option<u64> {
        self.len
            .checked_mul(self.width as u64)?
            .checked_add(HEADER_SIZE as u64)
    }

    pub fn check_width(&self, expected: usize, element: &str) -> Result<()> {
        if self.width as usize != expected {
            return Err(Error::schema_mismatch(
                element,
                format!("record width {}, expected {expected}", self.width),
            ));
        }
        Ok(())
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use fsindex_common::error::ErrorKind;

    use super::{HEADER_SIZE, StoreHeader};

    #[test]
    fn test_header_encode_decode() {
        let header = StoreHeader { width: 32, len: 17 };
        let buf = header.encode();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], b"FSAS");
        assert_eq!(StoreHeader::decode(&buf, "test").unwrap(), header);
        assert_eq!(header.data_end(), Some(64 + 17 * 32));

        let huge = StoreHeader {
            width: 8,
            len: u64::MAX / 4,
        };
        assert_eq!(huge.data_end(), None);
    }

    #[test]
    fn test_header_rejects_foreign_data() {
        let mut buf = StoreHeader::new(8).encode();
        buf[0] = b'X';
        assert!(matches!(
            StoreHeader::decode(&buf, "test").unwrap_err().kind(),
            ErrorKind::SchemaMismatch { .. }
        ));

        let mut buf = StoreHeader::new(8).encode();
        buf[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            StoreHeader::decode(&buf, "test").unwrap_err().kind(),
            ErrorKind::SchemaMismatch { .. }
        ));

        assert!(StoreHeader::decode(&buf[..10], "test").is_err());
    }

    #[test]
    fn test_header_width_check() {
        let header = StoreHeader::new(8);
        assert!(header.check_width(8, "test").is_ok());
        assert!(matches!(
            header.check_width(4, "test").unwrap_err().kind(),
            ErrorKind::SchemaMismatch { .. }
        ));
    }
}
