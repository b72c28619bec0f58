use thiserror::Error;

use super::types::PageId;

/// Storage engine error types.
///
/// Every variant except `FieldTooLong` signals corruption or a programmer
/// error; expected outcomes such as a duplicate key are reported through
/// [`InsertOutcome`](super::InsertOutcome) instead.
#[derive(Error, Debug)]
pub enum LeafDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page {page_id} is beyond the table capacity of {max_pages} pages")]
    PageOutOfBounds { page_id: PageId, max_pages: u32 },

    #[error("Page {page_id} is not part of the table, which spans {num_pages} pages")]
    PageNotAllocated { page_id: PageId, num_pages: u32 },

    #[error("Cell index {index} out of range for node with {count} cells")]
    CellOutOfRange { index: usize, count: usize },

    #[error("Tried to flush page {0} which is not cached")]
    PageNotCached(PageId),

    #[error("Table file is not a whole number of pages: {file_len} bytes with {page_size}-byte pages")]
    CorruptFile { file_len: u64, page_size: usize },

    #[error("Corrupt node: {0}")]
    CorruptNode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Field {field} is {len} bytes, column holds at most {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl LeafDbError {
    /// Returns true for conditions that indicate a corrupt table or a bug,
    /// as opposed to rejected caller input.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LeafDbError::FieldTooLong { .. })
    }
}

pub type Result<T> = std::result::Result<T, LeafDbError>;
