use super::error::Result;
use super::types::PageId;
use crate::index::NodeLayout;

/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default maximum number of pages a table may hold
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Width of the username column in bytes
pub const COLUMN_USERNAME_SIZE: usize = 32;

/// Width of the email column in bytes
pub const COLUMN_EMAIL_SIZE: usize = 255;

/// Page 0 is always the table root
pub const ROOT_PAGE_ID: PageId = PageId(0);

/// Configuration for a table handle.
///
/// The page size is not stored in the file, so a table must be reopened
/// with the configuration it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Page size in bytes.
    pub page_size: usize,

    /// Maximum number of pages the table may allocate.
    pub max_pages: u32,

    /// Optional cap on internal node fan-out (cells per internal node).
    /// `None` uses as many cells as fit in a page.
    pub max_internal_cells: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_internal_cells: None,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the page capacity of the table.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Caps the number of cells per internal node.
    pub fn with_max_internal_cells(mut self, cells: usize) -> Self {
        self.max_internal_cells = Some(cells);
        self
    }

    /// Validates the configuration and computes the node layout from it.
    pub fn layout(&self) -> Result<NodeLayout> {
        NodeLayout::new(self)
    }
}
