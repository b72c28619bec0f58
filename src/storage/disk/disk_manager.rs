use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{LeafDbError, PageId, Result};

/// DiskManager is responsible for reading and writing whole pages to/from
/// the table file. It knows nothing about page contents.
pub struct DiskManager {
    /// The table file
    db_file: Mutex<File>,
    /// Path to the table file
    db_path: String,
    /// Page size in bytes
    page_size: usize,
    /// File length in bytes when the file was opened
    file_len: u64,
    /// Number of disk reads performed
    num_reads: AtomicU32,
    /// Number of disk writes performed
    num_writes: AtomicU32,
}

impl DiskManager {
    /// Opens the table file at `db_path`, creating it if it doesn't exist.
    ///
    /// Fails with `CorruptFile` if the file length is not a whole number of
    /// pages.
    pub fn open<P: AsRef<Path>>(db_path: P, page_size: usize) -> Result<Self> {
        let path_str = db_path.as_ref().to_string_lossy().to_string();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&db_path)?;

        let file_len = file.metadata()?.len();
        if file_len % page_size as u64 != 0 {
            return Err(LeafDbError::CorruptFile {
                file_len,
                page_size,
            });
        }

        debug!(path = %path_str, file_len, page_size, "opened table file");

        Ok(Self {
            db_file: Mutex::new(file),
            db_path: path_str,
            page_size,
            file_len,
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        })
    }

    /// Reads a page from disk into the provided buffer.
    /// The buffer must be exactly `page_size` bytes. Bytes past the end of
    /// the file are left zeroed.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        debug_assert_eq!(data.len(), self.page_size, "Buffer must be page_size bytes");

        let offset = page_id.file_offset(self.page_size);

        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < data.len() {
            match file.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        data[filled..].fill(0);

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes a page to disk from the provided buffer.
    /// The buffer must be exactly `page_size` bytes.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len(), self.page_size, "Buffer must be page_size bytes");

        let offset = page_id.file_offset(self.page_size);

        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the number of whole pages the file held when it was opened.
    pub fn num_pages_on_disk(&self) -> u32 {
        (self.file_len / self.page_size as u64) as u32
    }

    /// Returns the file length in bytes at open time.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of disk reads performed.
    pub fn get_num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of disk writes performed.
    pub fn get_num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    /// Returns the path to the table file.
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// Flushes buffered writes to stable storage.
    pub fn sync(&self) -> Result<()> {
        let mut file = self.db_file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let file = self.db_file.get_mut();
        let _ = file.sync_all();
    }
}
