//! Positional-I/O store backend.
//!
//! Records are written with `pwrite`-style calls and read back with
//! `pread`-style calls; nothing is mapped. Appends accumulate in a write buffer
//! that is written out once it reaches [`WRITE_BUFFER_SIZE`] bytes, and the file
//! is preallocated in doubling steps so the filesystem sees few extensions.
//! Every read returns an owned copy (records still sitting in the write buffer
//! are served from it).

use std::{
    borrow::Cow,
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use fsindex_common::{Result, error::Error};

use crate::{
    Backend, FixedSizeArrayStore, check_index, check_range, check_whole_records,
    header::{HEADER_SIZE, StoreHeader},
    io::{file_read_at_exact, file_write_at},
};

pub const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

pub struct FileStore {
    path: PathBuf,
    file: File,
    width: usize,
    /// Records already written to the file.
    written: u64,
    /// Appended records not yet written.
    pending: Vec<u8>,
    /// Number of records the current file length can hold.
    allocated: u64,
    writable: bool,
}

impl FileStore {
    /// Creates a new store, or reopens an existing one for appending.
    pub fn create(path: &Path, width: usize, capacity_hint: u64) -> Result<FileStore> {
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
        file.set_len(HEADER_SIZE as u64 + capacity_hint * width as u64)
            .map_err(|e| Error::io(element, e))?;
        StoreHeader::new(width).write_to(&file, path)?;
        log::debug!(
            "created file store {} (width {width}, capacity {capacity_hint})",
            path.display()
        );
        Ok(FileStore {
            path: path.to_path_buf(),
            file,
            width,
            written: 0,
            pending: Vec::new(),
            allocated: capacity_hint,
            writable: true,
        })
    }

    fn open_writable(path: &Path, width: usize) -> Result<FileStore> {
        let element = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(element.clone(), e))?;
        let header = StoreHeader::read_from(&file, path)?;
        header.check_width(width, &element)?;
        let file_len = file.metadata().map_err(|e| Error::io(element, e))?.len();
        Ok(FileStore {
            path: path.to_path_buf(),
            file,
            width,
            written: header.len,
            pending: Vec::new(),
            allocated: (file_len - HEADER_SIZE as u64) / width as u64,
            writable: true,
        })
    }

    /// Opens an existing store read-only.
    pub fn open(path: &Path) -> Result<FileStore> {
        let file = File::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        let header = StoreHeader::read_from(&file, path)?;
        Ok(FileStore {
            path: path.to_path_buf(),
            file,
            width: header.width as usize,
            written: header.len,
            pending: Vec::new(),
            allocated: header.len,
            writable: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, e: std::io::Error) -> Error {
        Error::io(self.path.display().to_string(), e)
    }

    fn record_pos(&self, index: u64) -> u64 {
        HEADER_SIZE as u64 + index * self.width as u64
    }

    fn write_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let count = (self.pending.len() / self.width) as u64;
        let required = self.written + count;
        if required > self.allocated {
            let new_allocated = required.max(self.allocated * 2);
            self.file
                .set_len(self.record_pos(new_allocated))
                .map_err(|e| self.io_err(e))?;
            self.allocated = new_allocated;
        }
        file_write_at(&self.file, self.record_pos(self.written), &self.pending)
            .map_err(|e| self.io_err(e))?;
        self.written = required;
        self.pending.clear();
        Ok(())
    }

    /// Copies records `[start, start + count)` into `buf`, reading the part
    /// that is on disk from the file and the rest from the write buffer.
    fn copy_records(&self, start: u64, count: u64, buf: &mut [u8]) -> Result<()> {
        let end = start + count;
        let from_file = end.min(self.written).saturating_sub(start);
        let split = from_file as usize * self.width;
        if from_file > 0 {
            file_read_at_exact(&self.file, self.record_pos(start), &mut buf[..split])
                .map_err(|e| self.io_err(e))?;
        }
        if split < buf.len() {
            let pending_start = (start.max(self.written) - self.written) as usize * self.width;
            let len = buf.len() - split;
            buf[split..].copy_from_slice(&self.pending[pending_start..pending_start + len]);
        }
        Ok(())
    }
}

impl FixedSizeArrayStore for FileStore {
    fn width(&self) -> usize {
        self.width
    }

    fn len(&self) -> u64 {
        self.written + (self.pending.len() / self.width) as u64
    }

    fn append_many(&mut self, records: &[u8]) -> Result<u64> {
        if !self.writable {
            return Err(Error::invalid_operation("append to a read-only store"));
        }
        check_whole_records(records, self.width)?;
        let first = self.len();
        self.pending.extend_from_slice(records);
        if self.pending.len() >= WRITE_BUFFER_SIZE {
            self.write_pending()?;
        }
        Ok(first)
    }

    fn read(&self, index: u64) -> Result<Cow<'_, [u8]>> {
        check_index(index, self.len())?;
        let mut buf = vec![0u8; self.width];
        self.copy_records(index, 1, &mut buf)?;
        Ok(Cow::Owned(buf))
    }

    fn read_range(&self, start: u64, count: u64) -> Result<Cow<'_, [u8]>> {
        check_range(start, count, self.len())?;
        let mut buf = vec![0u8; count as usize * self.width];
        self.copy_records(start, count, &mut buf)?;
        Ok(Cow::Owned(buf))
    }

    fn flush(&mut self) -> Result<()> {
        if !self.writable {
            return Ok(());
        }
        self.write_pending()?;
        StoreHeader {
            width: self.width as u32,
            len: self.written,
        }
        .write_to(&self.file, &self.path)?;
        self.file.sync_data().map_err(|e| self.io_err(e))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        if !self.writable {
            return Ok(());
        }
        self.flush()?;
        self.file
            .set_len(self.record_pos(self.written))
            .map_err(|e| self.io_err(e))?;
        self.file.sync_all().map_err(|e| self.io_err(e))?;
        log::debug!(
            "closed file store {} ({} records)",
            self.path.display(),
            self.written
        );
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::File
    }

    fn is_writable(&self) -> bool {
        self.writable
    }
}
