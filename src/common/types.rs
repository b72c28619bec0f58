use std::fmt;

/// Page identifier - the page number of a page in the table file.
///
/// Page numbers are stable for the lifetime of a table: a page is never
/// renumbered, so a `PageId` doubles as the page cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Byte offset of this page in a file made of `page_size` pages.
    pub fn file_offset(&self, page_size: usize) -> u64 {
        (self.0 as u64) * (page_size as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Result of an insert that ran to completion.
///
/// Only `Success` modifies the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Success,
    DuplicateKey,
    TableFull,
}
