use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::error::FileResult;
use super::{PageId, PAGE_SIZE};

/// Paged I/O over the single database file backing a buffer pool
///
/// The file is a raw concatenation of pages: page `p` occupies bytes
/// `[p * PAGE_SIZE, (p + 1) * PAGE_SIZE)`. There is no file header and
/// the file may be shorter than the highest allocated page id.
pub struct DiskManager {
    file: File,
}

impl DiskManager {
    /// Open the database file, creating it if it does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Read a page into the buffer, returning the number of bytes the file
    /// actually held for it
    ///
    /// A read past the end of the file, or one that comes up short, yields
    /// zeroed bytes for the missing tail: recently allocated pages may not
    /// have been flushed yet.
    pub fn read_page(&mut self, page_id: PageId, buffer: &mut [u8; PAGE_SIZE]) -> FileResult<usize> {
        let offset = page_id as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        let bytes_read = self.file.read(buffer)?;
        buffer[bytes_read..].fill(0);
        Ok(bytes_read)
    }

    /// Write a page at its slot in the file
    pub fn write_page(&mut self, page_id: PageId, buffer: &[u8; PAGE_SIZE]) -> FileResult<()> {
        let offset = page_id as u64 * PAGE_SIZE as u64;
        let required_size = offset + PAGE_SIZE as u64;

        // extend the file when writing past the current end
        let current_size = self.file.metadata()?.len();
        if current_size < required_size {
            self.file.set_len(required_size)?;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buffer)?;
        // no sync here - the OS batches writes, sync() is explicit

        Ok(())
    }

    /// Flush OS buffers for the file to disk
    pub fn sync(&mut self) -> FileResult<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Number of pages the file currently holds
    pub fn page_count(&self) -> FileResult<u64> {
        let file_size = self.file.metadata()?.len();
        Ok(file_size.div_ceil(PAGE_SIZE as u64))
    }
}
