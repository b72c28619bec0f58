use std::collections::HashMap;
use std::path::Path;

use tracing::trace;

use crate::common::{LeafDbError, PageId, Result};
use crate::storage::disk::DiskManager;

/// PageStore maps page numbers to in-memory page buffers.
///
/// Pages are faulted in lazily on first access and stay cached for the
/// lifetime of the store; nothing is written back until [`flush`] or
/// [`flush_all`] is called. There is no eviction, so every page the table
/// has touched is resident.
///
/// [`flush`]: PageStore::flush
/// [`flush_all`]: PageStore::flush_all
pub struct PageStore {
    /// File I/O for the table file
    disk_manager: DiskManager,
    /// Page table: maps page IDs to their buffers
    pages: HashMap<PageId, Box<[u8]>>,
    /// One past the highest page number known to exist, on disk or in cache
    num_pages: u32,
    /// Page size in bytes
    page_size: usize,
    /// Page numbers must stay below this
    max_pages: u32,
}

impl PageStore {
    /// Opens a page store over the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize, max_pages: u32) -> Result<Self> {
        let disk_manager = DiskManager::open(path, page_size)?;
        let num_pages = disk_manager.num_pages_on_disk();

        Ok(Self {
            disk_manager,
            pages: HashMap::new(),
            num_pages,
            page_size,
            max_pages,
        })
    }

    /// Returns a mutable view of page `page_id`, loading it on a cache miss.
    ///
    /// A page that lies within the file is read from disk; a page beyond the
    /// end of the file starts out zero-filled. Fails with `PageOutOfBounds`
    /// if `page_id` is not below the configured page capacity.
    pub fn get_page(&mut self, page_id: PageId) -> Result<&mut [u8]> {
        if page_id.as_u32() >= self.max_pages {
            return Err(LeafDbError::PageOutOfBounds {
                page_id,
                max_pages: self.max_pages,
            });
        }

        if !self.pages.contains_key(&page_id) {
            let mut page = vec![0u8; self.page_size].into_boxed_slice();
            if page_id.as_u32() < self.disk_manager.num_pages_on_disk() {
                self.disk_manager.read_page(page_id, &mut page)?;
                trace!(page = page_id.as_u32(), "page fault: loaded from disk");
            } else {
                trace!(page = page_id.as_u32(), "page fault: new zeroed page");
            }

            self.pages.insert(page_id, page);
            if page_id.as_u32() >= self.num_pages {
                self.num_pages = page_id.as_u32() + 1;
            }
        }

        self.pages
            .get_mut(&page_id)
            .map(|page| &mut page[..])
            .ok_or(LeafDbError::PageNotCached(page_id))
    }

    /// Returns the next page number past every page tracked so far.
    ///
    /// Page numbers are never reused. The returned page only becomes live
    /// once it is fetched with [`get_page`](PageStore::get_page).
    pub fn get_unused_page_num(&self) -> PageId {
        PageId::new(self.num_pages)
    }

    /// Writes the full buffer of a cached page to its file offset.
    ///
    /// Flushing a page that was never loaded is a bug in the caller and
    /// fails with `PageNotCached`.
    pub fn flush(&self, page_id: PageId) -> Result<()> {
        let page = self
            .pages
            .get(&page_id)
            .ok_or(LeafDbError::PageNotCached(page_id))?;

        self.disk_manager.write_page(page_id, page)?;
        trace!(page = page_id.as_u32(), "flushed page");
        Ok(())
    }

    /// Flushes every cached page in page order, then syncs the file.
    /// Returns the number of pages written.
    pub fn flush_all(&self) -> Result<usize> {
        let mut page_ids: Vec<PageId> = self.pages.keys().copied().collect();
        page_ids.sort_unstable();

        for &page_id in &page_ids {
            self.flush(page_id)?;
        }
        self.disk_manager.sync()?;

        Ok(page_ids.len())
    }

    /// Returns true if the page is resident in the cache.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.pages.contains_key(&page_id)
    }

    /// Returns the number of pages currently cached.
    pub fn cached_page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns one past the highest page number in use.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn disk_manager(&self) -> &DiskManager {
        &self.disk_manager
    }
}
