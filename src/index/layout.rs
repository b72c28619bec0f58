use crate::common::{LeafDbError, Result, TableConfig};
use crate::tuple::ROW_SIZE;

// Common node header
pub const NODE_TYPE_SIZE: usize = std::mem::size_of::<u8>();
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = std::mem::size_of::<u8>();
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = std::mem::size_of::<u32>();
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// Leaf node header
pub const LEAF_NODE_NUM_CELLS_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_NEXT_LEAF_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;

// Leaf node body
pub const LEAF_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_KEY_OFFSET: usize = 0;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;

// Internal node header
pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal node body
pub const INTERNAL_NODE_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// Page geometry derived from a [`TableConfig`].
///
/// Computed once when a table is opened; every node accessor takes its
/// capacities and cell sizes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    page_size: usize,
    leaf_cell_size: usize,
    max_leaf_cells: usize,
    leaf_left_split_count: usize,
    leaf_right_split_count: usize,
    max_internal_cells: usize,
}

impl NodeLayout {
    pub fn new(config: &TableConfig) -> Result<Self> {
        let page_size = config.page_size;
        let leaf_cell_size = LEAF_NODE_KEY_SIZE + ROW_SIZE;

        if config.max_pages == 0 {
            return Err(LeafDbError::InvalidConfig(
                "max_pages must be at least 1".to_string(),
            ));
        }

        // A leaf must hold two cells for a split to leave both halves non-empty
        let min_page_size = LEAF_NODE_HEADER_SIZE + 2 * leaf_cell_size;
        if page_size < min_page_size {
            return Err(LeafDbError::InvalidConfig(format!(
                "page size {} is too small, need at least {} bytes",
                page_size, min_page_size
            )));
        }

        let max_leaf_cells = (page_size - LEAF_NODE_HEADER_SIZE) / leaf_cell_size;
        // The odd cell of a split goes left
        let leaf_right_split_count = (max_leaf_cells + 1) / 2;
        let leaf_left_split_count = (max_leaf_cells + 1) - leaf_right_split_count;

        let internal_fit = (page_size - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE;
        let max_internal_cells = match config.max_internal_cells {
            Some(cells) if cells < 2 => {
                return Err(LeafDbError::InvalidConfig(format!(
                    "internal nodes need at least 2 cells, got {}",
                    cells
                )));
            }
            Some(cells) if cells > internal_fit => {
                return Err(LeafDbError::InvalidConfig(format!(
                    "{} internal cells do not fit in a {}-byte page (max {})",
                    cells, page_size, internal_fit
                )));
            }
            Some(cells) => cells,
            None => internal_fit,
        };

        Ok(Self {
            page_size,
            leaf_cell_size,
            max_leaf_cells,
            leaf_left_split_count,
            leaf_right_split_count,
            max_internal_cells,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Size of one leaf cell: key plus row.
    pub fn leaf_cell_size(&self) -> usize {
        self.leaf_cell_size
    }

    pub fn max_leaf_cells(&self) -> usize {
        self.max_leaf_cells
    }

    /// Cells kept by the left (original) leaf after a split.
    pub fn leaf_left_split_count(&self) -> usize {
        self.leaf_left_split_count
    }

    /// Cells moved to the new right leaf after a split.
    pub fn leaf_right_split_count(&self) -> usize {
        self.leaf_right_split_count
    }

    pub fn max_internal_cells(&self) -> usize {
        self.max_internal_cells
    }

    /// Keys kept by the left internal node when `max_internal_cells + 1`
    /// keys are split. The key after them moves up as the left node's max.
    pub fn internal_left_split_count(&self) -> usize {
        (self.max_internal_cells + 1) / 2
    }

    /// Byte offset of leaf cell `index`.
    pub fn leaf_cell_offset(&self, index: usize) -> usize {
        LEAF_NODE_HEADER_SIZE + index * self.leaf_cell_size
    }

    /// Byte offset of internal cell `index`.
    pub fn internal_cell_offset(&self, index: usize) -> usize {
        INTERNAL_NODE_HEADER_SIZE + index * INTERNAL_NODE_CELL_SIZE
    }
}
