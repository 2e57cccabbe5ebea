//! Memory-mapped store backend.
//!
//! The whole file (header plus preallocated record area) is mapped. Appends copy
//! into the mapping and double the file length when the preallocated area runs
//! out, remapping afterwards. Reads borrow directly from the mapping, so a
//! `read_range` over a posting list costs no copy; page faults are left to the
//! OS page cache.

use std::{
    borrow::Cow,
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use fsindex_common::{Result, error::Error};
use memmap2::{Mmap, MmapMut};

use crate::{
    Backend, FixedSizeArrayStore, check_index, check_range, check_whole_records,
    header::{HEADER_SIZE, StoreHeader},
};

/// Minimum number of records the mapping grows to.
const MIN_CAPACITY: u64 = 64;

enum Mapping {
    Writable(MmapMut),
    ReadOnly(Mmap),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::Writable(map) => map,
            Mapping::ReadOnly(map) => map,
        }
    }
}

pub struct MmapStore {
    path: PathBuf,
    file: File,
    map: Option<Mapping>,
    width: usize,
    len: u64,
    /// Number of records the current file length can hold.
    capacity: u64,
}

impl MmapStore {
    /// Creates a new store, or reopens an existing one for appending.
    pub fn create(path: &Path, width: usize, capacity_hint: u64) -> Result<MmapStore> {
        if path.exists() {
            return Self::open_writable(path, width);
        }
        let element = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::io(element.clone(), e))?;
        let capacity = capacity_hint.max(MIN_CAPACITY);
        file.set_len(HEADER_SIZE as u64 + capacity * width as u64)
            .map_err(|e| Error::io(element.clone(), e))?;
        StoreHeader::new(width).write_to(&file, path)?;
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(|e| Error::io(element, e))?;
        log::debug!(
            "created mmap store {} (width {width}, capacity {capacity})",
            path.display()
        );
        Ok(MmapStore {
            path: path.to_path_buf(),
            file,
            map: Some(Mapping::Writable(map)),
            width,
            len: 0,
            capacity,
        })
    }

    fn open_writable(path: &Path, width: usize) -> Result<MmapStore> {
        let element = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(element.clone(), e))?;
        let header = StoreHeader::read_from(&file, path)?;
        header.check_width(width, &element)?;
        let file_len = file
            .metadata()
            .map_err(|e| Error::io(element.clone(), e))?
            .len();
        let capacity = (file_len - HEADER_SIZE as u64) / width as u64;
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(|e| Error::io(element, e))?;
        log::debug!(
            "reopened mmap store {} for append ({} records)",
            path.display(),
            header.len
        );
        Ok(MmapStore {
            path: path.to_path_buf(),
            file,
            map: Some(Mapping::Writable(map)),
            width,
            len: header.len,
            capacity,
        })
    }

    /// Opens an existing store read-only.
    pub fn open(path: &Path) -> Result<MmapStore> {
        let element = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::io(element.clone(), e))?;
        let header = StoreHeader::read_from(&file, path)?;
        let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(element, e))?;
        let width = header.width as usize;
        let capacity = (map.len() - HEADER_SIZE) as u64 / width as u64;
        Ok(MmapStore {
            path: path.to_path_buf(),
            file,
            map: Some(Mapping::ReadOnly(map)),
            width,
            len: header.len,
            capacity,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn bytes(&self) -> &[u8] {
        self.map.as_ref().map(Mapping::bytes).unwrap_or_default()
    }

    fn record_offset(&self, index: u64) -> usize {
        HEADER_SIZE + index as usize * self.width
    }

    fn writable_map(&mut self) -> Result<&mut MmapMut> {
        match self.map.as_mut() {
            Some(Mapping::Writable(map)) => Ok(map),
            _ => Err(Error::invalid_operation("append to a read-only store")),
        }
    }

    fn ensure_capacity(&mut self, required: u64) -> Result<()> {
        if required <= self.capacity {
            return Ok(());
        }
        let new_capacity = required.max(self.capacity * 2).max(MIN_CAPACITY);
        let element = self.path.display().to_string();
        if let Some(Mapping::Writable(map)) = self.map.take() {
            map.flush().map_err(|e| Error::io(element.clone(), e))?;
        }
        self.file
            .set_len(HEADER_SIZE as u64 + new_capacity * self.width as u64)
            .map_err(|e| Error::io(element.clone(), e))?;
        let map = unsafe { MmapMut::map_mut(&self.file) }.map_err(|e| Error::io(element, e))?;
        self.map = Some(Mapping::Writable(map));
        log::trace!(
            "grew mmap store {} from {} to {new_capacity} records",
            self.path.display(),
            self.capacity
        );
        self.capacity = new_capacity;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let header = StoreHeader {
            width: self.width as u32,
            len: self.len,
        }
        .encode();
        let map = self.writable_map()?;
        map[..HEADER_SIZE].copy_from_slice(&header);
        Ok(())
    }
}

impl FixedSizeArrayStore for MmapStore {
    fn width(&self) -> usize {
        self.width
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn append_many(&mut self, records: &[u8]) -> Result<u64> {
        let count = check_whole_records(records, self.width)?;
        self.writable_map()?;
        let first = self.len;
        if count == 0 {
            return Ok(first);
        }
        self.ensure_capacity(first + count)?;
        let offset = self.record_offset(first);
        let map = self.writable_map()?;
        map[offset..offset + records.len()].copy_from_slice(records);
        self.len += count;
        Ok(first)
    }

    fn read(&self, index: u64) -> Result<Cow<'_, [u8]>> {
        check_index(index, self.len)?;
        let offset = self.record_offset(index);
        Ok(Cow::Borrowed(&self.bytes()[offset..offset + self.width]))
    }

    fn read_range(&self, start: u64, count: u64) -> Result<Cow<'_, [u8]>> {
        check_range(start, count, self.len)?;
        let offset = self.record_offset(start);
        let end = offset + count as usize * self.width;
        Ok(Cow::Borrowed(&self.bytes()[offset..end]))
    }

    fn flush(&mut self) -> Result<()> {
        if !self.is_writable() {
            return Ok(());
        }
        self.write_header()?;
        let element = self.path.display().to_string();
        self.writable_map()?
            .flush()
            .map_err(|e| Error::io(element, e))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        if !self.is_writable() {
            return Ok(());
        }
        self.flush()?;
        // The mapping must be released before the file can shrink.
        self.map = None;
        let element = self.path.display().to_string();
        let end = HEADER_SIZE as u64 + self.len * self.width as u64;
        self.file
            .set_len(end)
            .map_err(|e| Error::io(element.clone(), e))?;
        self.file.sync_all().map_err(|e| Error::io(element, e))?;
        log::debug!(
            "closed mmap store {} ({} records)",
            self.path.display(),
            self.len
        );
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::Mmap
    }

    fn is_writable(&self) -> bool {
        matches!(self.map, Some(Mapping::Writable(_)))
    }
}
