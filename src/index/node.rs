use crate::common::{LeafDbError, PageId, Result};
use crate::tuple::{Row, ROW_SIZE};

use super::layout::*;

/// Sentinel stored in child pointers that have not been assigned yet.
const INVALID_PAGE: u32 = u32::MAX;

/// Node tag stored in the first byte of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let bytes: [u8; 4] = [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ];
    u32::from_le_bytes(bytes)
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn check_page_len(data: &[u8], layout: &NodeLayout) -> Result<()> {
    if data.len() != layout.page_size() {
        return Err(LeafDbError::CorruptNode(format!(
            "page buffer holds {} bytes, expected {}",
            data.len(),
            layout.page_size()
        )));
    }
    Ok(())
}

/// Reads the node tag of a page.
pub fn node_type(page: &[u8]) -> Result<NodeType> {
    if page.len() < COMMON_NODE_HEADER_SIZE {
        return Err(LeafDbError::CorruptNode(format!(
            "page holds {} bytes, shorter than a node header",
            page.len()
        )));
    }
    match page[NODE_TYPE_OFFSET] {
        0 => Ok(NodeType::Internal),
        1 => Ok(NodeType::Leaf),
        tag => Err(LeafDbError::CorruptNode(format!("unknown node type tag {}", tag))),
    }
}

pub(crate) fn is_root(page: &[u8]) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

pub(crate) fn set_root(page: &mut [u8], is_root: bool) {
    page[IS_ROOT_OFFSET] = u8::from(is_root);
}

pub(crate) fn parent(page: &[u8]) -> PageId {
    PageId::new(read_u32(page, PARENT_POINTER_OFFSET))
}

pub(crate) fn set_parent(page: &mut [u8], parent: PageId) {
    write_u32(page, PARENT_POINTER_OFFSET, parent.as_u32());
}

/// View of a page as a leaf node.
///
/// Works over `&[u8]` for reads and `&mut [u8]` for writes. Cell accessors
/// are bounds-checked against the node's own cell count.
pub struct LeafNode<B> {
    data: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    /// Wraps a page that must already hold a leaf node.
    pub fn new(data: B, layout: NodeLayout) -> Result<Self> {
        check_page_len(data.as_ref(), &layout)?;
        let node = Self { data, layout };
        if node_type(node.bytes())? != NodeType::Leaf {
            return Err(LeafDbError::CorruptNode("expected a leaf node".to_string()));
        }
        if node.num_cells() > layout.max_leaf_cells() {
            return Err(LeafDbError::CorruptNode(format!(
                "leaf holds {} cells, capacity is {}",
                node.num_cells(),
                layout.max_leaf_cells()
            )));
        }
        Ok(node)
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> PageId {
        parent(self.bytes())
    }

    pub fn num_cells(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    /// Next leaf in key order, if any. Page 0 is always the root and so
    /// doubles as the "no sibling" marker.
    pub fn next_leaf(&self) -> Option<PageId> {
        match read_u32(self.bytes(), LEAF_NODE_NEXT_LEAF_OFFSET) {
            0 => None,
            page => Some(PageId::new(page)),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.num_cells();
        if index >= count {
            return Err(LeafDbError::CellOutOfRange { index, count });
        }
        Ok(())
    }

    /// Raw bytes of cell `index` (key followed by row).
    pub fn cell(&self, index: usize) -> Result<&[u8]> {
        self.check_index(index)?;
        let offset = self.layout.leaf_cell_offset(index);
        Ok(&self.bytes()[offset..offset + self.layout.leaf_cell_size()])
    }

    pub fn key(&self, index: usize) -> Result<u32> {
        self.check_index(index)?;
        let offset = self.layout.leaf_cell_offset(index) + LEAF_NODE_KEY_OFFSET;
        Ok(read_u32(self.bytes(), offset))
    }

    /// Raw row bytes of cell `index`.
    pub fn value(&self, index: usize) -> Result<&[u8]> {
        self.check_index(index)?;
        let offset = self.layout.leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        Ok(&self.bytes()[offset..offset + ROW_SIZE])
    }

    pub fn row(&self, index: usize) -> Result<Row> {
        Row::deserialize(self.value(index)?)
    }

    /// Largest key in the leaf, `None` if it is empty.
    pub fn max_key(&self) -> Result<Option<u32>> {
        match self.num_cells() {
            0 => Ok(None),
            n => self.key(n - 1).map(Some),
        }
    }

    /// Binary search for `key`. Returns the index of the cell holding it, or
    /// the index where it would be inserted (`num_cells` if it sorts last).
    pub fn find_slot(&self, key: u32) -> Result<usize> {
        let mut min_index = 0;
        let mut one_past_max_index = self.num_cells();

        while one_past_max_index != min_index {
            let index = min_index + (one_past_max_index - min_index) / 2;
            let key_at_index = self.key(index)?;

            if key == key_at_index {
                return Ok(index);
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        Ok(min_index)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Formats the page as an empty, non-root leaf.
    pub fn initialize(mut data: B, layout: NodeLayout) -> Result<Self> {
        check_page_len(data.as_ref(), &layout)?;
        let page = data.as_mut();
        page.fill(0);
        page[NODE_TYPE_OFFSET] = NodeType::Leaf as u8;
        Ok(Self { data, layout })
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, page_id: PageId) {
        set_parent(self.bytes_mut(), page_id);
    }

    pub fn set_next_leaf(&mut self, page_id: Option<PageId>) {
        let value = page_id.map(|p| p.as_u32()).unwrap_or(0);
        write_u32(self.bytes_mut(), LEAF_NODE_NEXT_LEAF_OFFSET, value);
    }

    fn set_num_cells(&mut self, count: usize) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, count as u32);
    }

    /// Mutable row bytes of cell `index`.
    pub fn value_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        self.check_index(index)?;
        let offset = self.layout.leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        Ok(&mut self.bytes_mut()[offset..offset + ROW_SIZE])
    }

    /// Inserts a cell at `index`, shifting the cells at and after it one
    /// slot to the right. The leaf must have spare capacity.
    pub fn insert(&mut self, index: usize, key: u32, row: &Row) -> Result<()> {
        let num_cells = self.num_cells();
        if num_cells >= self.layout.max_leaf_cells() {
            return Err(LeafDbError::CellOutOfRange {
                index: num_cells,
                count: self.layout.max_leaf_cells(),
            });
        }
        if index > num_cells {
            return Err(LeafDbError::CellOutOfRange {
                index,
                count: num_cells,
            });
        }

        let start = self.layout.leaf_cell_offset(index);
        let end = self.layout.leaf_cell_offset(num_cells);
        let cell_size = self.layout.leaf_cell_size();
        self.bytes_mut().copy_within(start..end, start + cell_size);

        self.write_cell(index, key, row)?;
        self.set_num_cells(num_cells + 1);
        Ok(())
    }

    fn write_cell(&mut self, index: usize, key: u32, row: &Row) -> Result<()> {
        let offset = self.layout.leaf_cell_offset(index);
        write_u32(self.bytes_mut(), offset + LEAF_NODE_KEY_OFFSET, key);
        row.serialize(&mut self.bytes_mut()[offset + LEAF_NODE_VALUE_OFFSET..])
    }

    /// Replaces the leaf's cells with `cells`, each a raw key + row cell.
    pub fn set_cells(&mut self, cells: &[Vec<u8>]) -> Result<()> {
        if cells.len() > self.layout.max_leaf_cells() {
            return Err(LeafDbError::CellOutOfRange {
                index: cells.len(),
                count: self.layout.max_leaf_cells(),
            });
        }

        let cell_size = self.layout.leaf_cell_size();
        if let Some(cell) = cells.iter().find(|cell| cell.len() != cell_size) {
            return Err(LeafDbError::CorruptNode(format!(
                "leaf cell holds {} bytes, expected {}",
                cell.len(),
                cell_size
            )));
        }
        for (i, cell) in cells.iter().enumerate() {
            let offset = self.layout.leaf_cell_offset(i);
            self.bytes_mut()[offset..offset + cell_size].copy_from_slice(&cell[..cell_size]);
        }
        self.set_num_cells(cells.len());
        Ok(())
    }
}

impl<'a> LeafNode<&'a mut [u8]> {
    /// Like [`value_mut`](Self::value_mut), but hands back the page borrow.
    pub fn into_value_mut(self, index: usize) -> Result<&'a mut [u8]> {
        self.check_index(index)?;
        let offset = self.layout.leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        let data = self.data;
        Ok(&mut data[offset..offset + ROW_SIZE])
    }
}

/// Builds a raw leaf cell for `key` and `row`.
pub fn encode_leaf_cell(layout: &NodeLayout, key: u32, row: &Row) -> Result<Vec<u8>> {
    let mut cell = vec![0u8; layout.leaf_cell_size()];
    write_u32(&mut cell, LEAF_NODE_KEY_OFFSET, key);
    row.serialize(&mut cell[LEAF_NODE_VALUE_OFFSET..])?;
    Ok(cell)
}

/// View of a page as an internal (routing) node.
///
/// Cell `i` holds a child pointer and the largest key in that child's
/// subtree; `right_child` covers every key above the last separator.
pub struct InternalNode<B> {
    data: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    /// Wraps a page that must already hold an internal node.
    pub fn new(data: B, layout: NodeLayout) -> Result<Self> {
        check_page_len(data.as_ref(), &layout)?;
        let node = Self { data, layout };
        if node_type(node.bytes())? != NodeType::Internal {
            return Err(LeafDbError::CorruptNode("expected an internal node".to_string()));
        }
        if node.num_keys() > layout.max_internal_cells() {
            return Err(LeafDbError::CorruptNode(format!(
                "internal node holds {} keys, capacity is {}",
                node.num_keys(),
                layout.max_internal_cells()
            )));
        }
        Ok(node)
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> PageId {
        parent(self.bytes())
    }

    pub fn num_keys(&self) -> usize {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    pub fn right_child(&self) -> Result<PageId> {
        match read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET) {
            INVALID_PAGE => Err(LeafDbError::CorruptNode(
                "internal node has no right child".to_string(),
            )),
            page => Ok(PageId::new(page)),
        }
    }

    /// Child pointer `index`; `index == num_keys` yields the right child.
    pub fn child(&self, index: usize) -> Result<PageId> {
        let num_keys = self.num_keys();
        if index > num_keys {
            return Err(LeafDbError::CellOutOfRange {
                index,
                count: num_keys + 1,
            });
        }
        if index == num_keys {
            return self.right_child();
        }

        let offset = self.layout.internal_cell_offset(index);
        Ok(PageId::new(read_u32(self.bytes(), offset)))
    }

    pub fn key(&self, index: usize) -> Result<u32> {
        let count = self.num_keys();
        if index >= count {
            return Err(LeafDbError::CellOutOfRange { index, count });
        }
        let offset = self.layout.internal_cell_offset(index) + INTERNAL_NODE_CHILD_SIZE;
        Ok(read_u32(self.bytes(), offset))
    }

    /// Index of the child whose subtree would hold `key`: the leftmost
    /// separator `>= key`, or `num_keys` (the right child) if there is none.
    pub fn find_child_index(&self, key: u32) -> Result<usize> {
        let mut min_index = 0;
        let mut max_index = self.num_keys();

        while min_index != max_index {
            let index = min_index + (max_index - min_index) / 2;
            if self.key(index)? >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        Ok(min_index)
    }

    /// All separator keys and child pointers, right child last.
    pub fn entries(&self) -> Result<(Vec<u32>, Vec<PageId>)> {
        let num_keys = self.num_keys();
        let mut keys = Vec::with_capacity(num_keys);
        let mut children = Vec::with_capacity(num_keys + 1);
        for i in 0..num_keys {
            keys.push(self.key(i)?);
            children.push(self.child(i)?);
        }
        children.push(self.right_child()?);
        Ok((keys, children))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    /// Formats the page as an empty, non-root internal node.
    pub fn initialize(mut data: B, layout: NodeLayout) -> Result<Self> {
        check_page_len(data.as_ref(), &layout)?;
        let page = data.as_mut();
        page.fill(0);
        page[NODE_TYPE_OFFSET] = NodeType::Internal as u8;
        write_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET, INVALID_PAGE);
        Ok(Self { data, layout })
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, page_id: PageId) {
        set_parent(self.bytes_mut(), page_id);
    }

    fn set_num_keys(&mut self, count: usize) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, count as u32);
    }

    pub fn set_right_child(&mut self, page_id: PageId) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, page_id.as_u32());
    }

    /// Repoints child `index`; `index == num_keys` sets the right child.
    pub fn set_child(&mut self, index: usize, page_id: PageId) -> Result<()> {
        let num_keys = self.num_keys();
        if index > num_keys {
            return Err(LeafDbError::CellOutOfRange {
                index,
                count: num_keys + 1,
            });
        }
        if index == num_keys {
            self.set_right_child(page_id);
        } else {
            let offset = self.layout.internal_cell_offset(index);
            write_u32(self.bytes_mut(), offset, page_id.as_u32());
        }
        Ok(())
    }

    /// Inserts cell `(child, key)` at `index`, shifting later cells right.
    /// The right child is untouched. The node must have spare capacity.
    pub fn insert_cell(&mut self, index: usize, child: PageId, key: u32) -> Result<()> {
        let num_keys = self.num_keys();
        if num_keys >= self.layout.max_internal_cells() {
            return Err(LeafDbError::CellOutOfRange {
                index: num_keys,
                count: self.layout.max_internal_cells(),
            });
        }
        if index > num_keys {
            return Err(LeafDbError::CellOutOfRange {
                index,
                count: num_keys,
            });
        }

        let start = self.layout.internal_cell_offset(index);
        let end = self.layout.internal_cell_offset(num_keys);
        self.bytes_mut()
            .copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);

        write_u32(self.bytes_mut(), start, child.as_u32());
        write_u32(self.bytes_mut(), start + INTERNAL_NODE_CHILD_SIZE, key);
        self.set_num_keys(num_keys + 1);
        Ok(())
    }

    /// Replaces the node's contents. `children` holds one more entry than
    /// `keys`; its last entry becomes the right child.
    pub fn set_entries(&mut self, keys: &[u32], children: &[PageId]) -> Result<()> {
        if keys.len() > self.layout.max_internal_cells() {
            return Err(LeafDbError::CellOutOfRange {
                index: keys.len(),
                count: self.layout.max_internal_cells(),
            });
        }
        if children.len() != keys.len() + 1 {
            return Err(LeafDbError::CorruptNode(format!(
                "{} keys need {} children, got {}",
                keys.len(),
                keys.len() + 1,
                children.len()
            )));
        }

        for (i, (&key, &child)) in keys.iter().zip(children).enumerate() {
            let offset = self.layout.internal_cell_offset(i);
            write_u32(self.bytes_mut(), offset, child.as_u32());
            write_u32(self.bytes_mut(), offset + INTERNAL_NODE_CHILD_SIZE, key);
        }
        self.set_num_keys(keys.len());
        self.set_right_child(children[keys.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableConfig;

    fn layout() -> NodeLayout {
        TableConfig::new()
            .with_page_size(1024)
            .with_max_internal_cells(3)
            .layout()
            .unwrap()
    }

    fn row(id: u32) -> Row {
        Row::new(id, &format!("user{}", id), &format!("user{}@example.com", id)).unwrap()
    }

    #[test]
    fn test_leaf_initialize() {
        let layout = layout();
        let mut data = vec![0xAAu8; layout.page_size()];
        let leaf = LeafNode::initialize(&mut data[..], layout).unwrap();

        assert_eq!(leaf.num_cells(), 0);
        assert!(!leaf.is_root());
        assert_eq!(leaf.next_leaf(), None);
        assert_eq!(node_type(&data).unwrap(), NodeType::Leaf);
    }

    #[test]
    fn test_leaf_insert_keeps_order() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut leaf = LeafNode::initialize(&mut data[..], layout).unwrap();

        for key in [20, 10, 30] {
            let slot = leaf.find_slot(key).unwrap();
            leaf.insert(slot, key, &row(key)).unwrap();
        }

        assert_eq!(leaf.num_cells(), 3);
        assert_eq!(leaf.key(0).unwrap(), 10);
        assert_eq!(leaf.key(1).unwrap(), 20);
        assert_eq!(leaf.key(2).unwrap(), 30);
        assert_eq!(leaf.row(1).unwrap(), row(20));
        assert_eq!(leaf.max_key().unwrap(), Some(30));
    }

    #[test]
    fn test_leaf_find_slot() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut leaf = LeafNode::initialize(&mut data[..], layout).unwrap();
        leaf.insert(0, 10, &row(10)).unwrap();
        leaf.insert(1, 20, &row(20)).unwrap();

        assert_eq!(leaf.find_slot(10).unwrap(), 0);
        assert_eq!(leaf.find_slot(20).unwrap(), 1);
        assert_eq!(leaf.find_slot(5).unwrap(), 0);
        assert_eq!(leaf.find_slot(15).unwrap(), 1);
        assert_eq!(leaf.find_slot(25).unwrap(), 2);
    }

    #[test]
    fn test_leaf_bounds_checks() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut leaf = LeafNode::initialize(&mut data[..], layout).unwrap();
        leaf.insert(0, 1, &row(1)).unwrap();

        assert!(matches!(
            leaf.key(1),
            Err(LeafDbError::CellOutOfRange { index: 1, count: 1 })
        ));
        assert!(leaf.value(5).is_err());
        assert!(leaf.value_mut(1).is_err());

        leaf.insert(1, 2, &row(2)).unwrap();
        leaf.insert(2, 3, &row(3)).unwrap();
        // 1024-byte pages hold three cells
        assert!(matches!(
            leaf.insert(3, 4, &row(4)),
            Err(LeafDbError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_leaf_rejects_internal_page() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        InternalNode::initialize(&mut data[..], layout).unwrap();

        assert!(matches!(
            LeafNode::new(&data[..], layout),
            Err(LeafDbError::CorruptNode(_))
        ));
    }

    #[test]
    fn test_short_buffers_are_corrupt() {
        let layout = layout();
        let mut short = vec![0u8; layout.page_size() - 1];

        assert!(matches!(node_type(&short[..3]), Err(LeafDbError::CorruptNode(_))));
        assert!(matches!(
            LeafNode::new(&short[..], layout),
            Err(LeafDbError::CorruptNode(_))
        ));
        assert!(matches!(
            InternalNode::new(&short[..], layout),
            Err(LeafDbError::CorruptNode(_))
        ));
        assert!(LeafNode::initialize(&mut short[..], layout).is_err());
        assert!(InternalNode::initialize(&mut short[..], layout).is_err());

        let mut data = vec![0u8; layout.page_size()];
        let mut leaf = LeafNode::initialize(&mut data[..], layout).unwrap();
        assert!(matches!(
            leaf.set_cells(&[vec![0u8; 4]]),
            Err(LeafDbError::CorruptNode(_))
        ));
        assert_eq!(leaf.num_cells(), 0);
    }

    #[test]
    fn test_unknown_node_tag() {
        let mut data = vec![0u8; 1024];
        data[NODE_TYPE_OFFSET] = 9;
        assert!(matches!(node_type(&data), Err(LeafDbError::CorruptNode(_))));
    }

    #[test]
    fn test_leaf_set_cells_and_next_leaf() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut leaf = LeafNode::initialize(&mut data[..], layout).unwrap();

        let cells: Vec<Vec<u8>> = [3, 7]
            .iter()
            .map(|&k| encode_leaf_cell(&layout, k, &row(k)).unwrap())
            .collect();
        leaf.set_cells(&cells).unwrap();
        leaf.set_next_leaf(Some(PageId::new(5)));

        assert_eq!(leaf.num_cells(), 2);
        assert_eq!(leaf.key(1).unwrap(), 7);
        assert_eq!(leaf.row(0).unwrap(), row(3));
        assert_eq!(leaf.next_leaf(), Some(PageId::new(5)));
    }

    #[test]
    fn test_internal_children_and_keys() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut node = InternalNode::initialize(&mut data[..], layout).unwrap();
        node.set_entries(&[10, 20], &[PageId::new(1), PageId::new(2), PageId::new(3)])
            .unwrap();

        assert_eq!(node.num_keys(), 2);
        assert_eq!(node.child(0).unwrap(), PageId::new(1));
        assert_eq!(node.child(2).unwrap(), PageId::new(3));
        assert_eq!(node.right_child().unwrap(), PageId::new(3));
        assert_eq!(node.key(1).unwrap(), 20);
        assert!(matches!(
            node.child(3),
            Err(LeafDbError::CellOutOfRange { index: 3, count: 3 })
        ));
        assert!(node.key(2).is_err());
    }

    #[test]
    fn test_internal_find_child_index() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut node = InternalNode::initialize(&mut data[..], layout).unwrap();
        node.set_entries(&[10, 20], &[PageId::new(1), PageId::new(2), PageId::new(3)])
            .unwrap();

        assert_eq!(node.find_child_index(1).unwrap(), 0);
        assert_eq!(node.find_child_index(10).unwrap(), 0);
        assert_eq!(node.find_child_index(11).unwrap(), 1);
        assert_eq!(node.find_child_index(20).unwrap(), 1);
        assert_eq!(node.find_child_index(21).unwrap(), 2);
    }

    #[test]
    fn test_internal_insert_cell() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut node = InternalNode::initialize(&mut data[..], layout).unwrap();
        node.set_entries(&[10, 30], &[PageId::new(1), PageId::new(3), PageId::new(4)])
            .unwrap();

        node.insert_cell(1, PageId::new(2), 20).unwrap();
        let (keys, children) = node.entries().unwrap();
        assert_eq!(keys, vec![10, 20, 30]);
        assert_eq!(
            children,
            vec![PageId::new(1), PageId::new(2), PageId::new(3), PageId::new(4)]
        );

        // Capped at three cells
        assert!(node.insert_cell(0, PageId::new(9), 1).is_err());
    }

    #[test]
    fn test_internal_without_right_child_is_corrupt() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let node = InternalNode::initialize(&mut data[..], layout).unwrap();
        assert!(matches!(node.right_child(), Err(LeafDbError::CorruptNode(_))));
    }

    #[test]
    fn test_header_fields() {
        let layout = layout();
        let mut data = vec![0u8; layout.page_size()];
        let mut node = InternalNode::initialize(&mut data[..], layout).unwrap();
        node.set_root(true);
        node.set_parent(PageId::new(42));

        assert!(is_root(&data));
        assert_eq!(parent(&data), PageId::new(42));
    }
}
