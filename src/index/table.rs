use std::path::Path;

use tracing::{debug, info};

use crate::buffer::PageStore;
use crate::common::{
    InsertOutcome, LeafDbError, PageId, Result, TableConfig, ROOT_PAGE_ID,
};
use crate::tuple::Row;

use super::cursor::{Cursor, Scan};
use super::layout::NodeLayout;
use super::node::{self, encode_leaf_cell, InternalNode, LeafNode, NodeType};

/// A single B-tree table stored in one file.
///
/// Page 0 is always the root. Leaves hold `key -> Row` cells sorted by key;
/// internal nodes route by the largest key of each child subtree. All pages
/// live in the [`PageStore`] cache and reach the file only on [`close`].
///
/// [`close`]: Table::close
pub struct Table {
    pager: PageStore,
    layout: NodeLayout,
    root_page_id: PageId,
}

impl Table {
    /// Opens the table at `path` with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, TableConfig::default())
    }

    /// Opens (or creates) the table at `path`. An empty file gets an empty
    /// leaf as its root.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TableConfig) -> Result<Self> {
        let layout = config.layout()?;
        let pager = PageStore::open(path, config.page_size, config.max_pages)?;

        let mut table = Self {
            pager,
            layout,
            root_page_id: ROOT_PAGE_ID,
        };

        if table.pager.num_pages() == 0 {
            let mut root = LeafNode::initialize(table.pager.get_page(ROOT_PAGE_ID)?, layout)?;
            root.set_root(true);
            debug!("initialized empty table");
        } else {
            let root = table.pager.get_page(ROOT_PAGE_ID)?;
            node::node_type(root)?;
            if !node::is_root(root) {
                return Err(LeafDbError::CorruptNode(
                    "page 0 is not flagged as the root".to_string(),
                ));
            }
            debug!(pages = table.pager.num_pages(), "opened existing table");
        }

        Ok(table)
    }

    /// Writes every cached page back to the file and releases the table.
    ///
    /// This is the only point at which data reaches the disk.
    pub fn close(self) -> Result<()> {
        let flushed = self.pager.flush_all()?;
        info!(pages = flushed, "closed table");
        Ok(())
    }

    pub fn layout(&self) -> NodeLayout {
        self.layout
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    /// Number of pages the table spans.
    pub fn num_pages(&self) -> u32 {
        self.pager.num_pages()
    }

    pub fn page_store(&self) -> &PageStore {
        &self.pager
    }

    #[cfg(test)]
    pub(crate) fn pager_mut(&mut self) -> &mut PageStore {
        &mut self.pager
    }

    /// Read-only bytes of a page, for inspecting nodes directly.
    pub fn page(&mut self, page_id: PageId) -> Result<&[u8]> {
        Ok(&*self.existing_page(page_id)?)
    }

    /// A page the table already spans. Page numbers read from node headers
    /// go through here so that a bad pointer never grows the table.
    fn existing_page(&mut self, page_id: PageId) -> Result<&mut [u8]> {
        let num_pages = self.pager.num_pages();
        if page_id.as_u32() >= num_pages {
            return Err(LeafDbError::PageNotAllocated { page_id, num_pages });
        }
        self.pager.get_page(page_id)
    }

    pub(crate) fn leaf(&mut self, page_id: PageId) -> Result<LeafNode<&mut [u8]>> {
        let layout = self.layout;
        LeafNode::new(self.existing_page(page_id)?, layout)
    }

    pub(crate) fn internal(&mut self, page_id: PageId) -> Result<InternalNode<&mut [u8]>> {
        let layout = self.layout;
        InternalNode::new(self.existing_page(page_id)?, layout)
    }

    pub(crate) fn node_type(&mut self, page_id: PageId) -> Result<NodeType> {
        node::node_type(self.existing_page(page_id)?)
    }

    /// Descends from the root to the leaf that would hold `key` and returns
    /// the leaf page and the key's slot (or insertion point) in it.
    fn locate(&mut self, key: u32) -> Result<(PageId, usize)> {
        let mut page_id = self.root_page_id;

        for _ in 0..=self.pager.max_pages() {
            match self.node_type(page_id)? {
                NodeType::Leaf => {
                    let slot = self.leaf(page_id)?.find_slot(key)?;
                    return Ok((page_id, slot));
                }
                NodeType::Internal => {
                    let node = self.internal(page_id)?;
                    let index = node.find_child_index(key)?;
                    page_id = node.child(index)?;
                }
            }
        }

        Err(LeafDbError::CorruptNode("tree descent does not terminate".to_string()))
    }

    /// Follows child 0 (or the right child) down to a leaf.
    fn edge_leaf(&mut self, rightmost: bool) -> Result<PageId> {
        let mut page_id = self.root_page_id;

        for _ in 0..=self.pager.max_pages() {
            if self.node_type(page_id)? == NodeType::Leaf {
                return Ok(page_id);
            }
            let node = self.internal(page_id)?;
            page_id = if rightmost {
                node.right_child()?
            } else {
                node.child(0)?
            };
        }

        Err(LeafDbError::CorruptNode("tree descent does not terminate".to_string()))
    }

    /// Number of levels from the root to the leaves (1 for a leaf root).
    pub fn depth(&mut self) -> Result<usize> {
        let mut depth = 1;
        let mut page_id = self.root_page_id;
        while self.node_type(page_id)? == NodeType::Internal {
            page_id = self.internal(page_id)?.child(0)?;
            depth += 1;
            if depth > self.pager.max_pages() as usize {
                return Err(LeafDbError::CorruptNode(
                    "tree descent does not terminate".to_string(),
                ));
            }
        }
        Ok(depth)
    }

    /// Largest key in the subtree rooted at `page_id`.
    fn node_max_key(&mut self, page_id: PageId) -> Result<u32> {
        let leaf_id = {
            let mut page_id = page_id;
            while self.node_type(page_id)? == NodeType::Internal {
                page_id = self.internal(page_id)?.right_child()?;
            }
            page_id
        };

        self.leaf(leaf_id)?.max_key()?.ok_or_else(|| {
            LeafDbError::CorruptNode(format!("leaf {} is empty below the root", leaf_id))
        })
    }

    /// Cursor at the first row in key order.
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        let page_id = self.edge_leaf(false)?;
        let num_cells = self.leaf(page_id)?.num_cells();
        Ok(Cursor::new(self, page_id, 0, num_cells == 0))
    }

    /// Cursor one past the last row.
    pub fn end(&mut self) -> Result<Cursor<'_>> {
        let page_id = self.edge_leaf(true)?;
        let num_cells = self.leaf(page_id)?.num_cells();
        Ok(Cursor::new(self, page_id, num_cells, true))
    }

    /// Cursor at `key`, or at the slot where `key` would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>> {
        let (page_id, slot) = self.locate(key)?;
        let end_of_table = {
            let leaf = self.leaf(page_id)?;
            slot >= leaf.num_cells() && leaf.next_leaf().is_none()
        };
        Ok(Cursor::new(self, page_id, slot, end_of_table))
    }

    /// Looks up the row stored under `key`.
    pub fn get(&mut self, key: u32) -> Result<Option<Row>> {
        let mut cursor = self.find(key)?;
        if cursor.key()? == Some(key) {
            cursor.row().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Iterates over every row in ascending key order.
    pub fn scan(&mut self) -> Result<Scan<'_>> {
        Ok(Scan::new(self.start()?))
    }

    /// Inserts `row` under `key`.
    ///
    /// A duplicate key or an exhausted page budget is reported through the
    /// outcome and leaves the table untouched.
    pub fn insert(&mut self, key: u32, row: &Row) -> Result<InsertOutcome> {
        let (page_id, slot, existing) = {
            let mut cursor = self.find(key)?;
            let existing = cursor.key()?;
            (cursor.page_id(), cursor.cell_num(), existing)
        };

        if existing == Some(key) {
            return Ok(InsertOutcome::DuplicateKey);
        }

        if self.leaf(page_id)?.num_cells() < self.layout.max_leaf_cells() {
            self.leaf(page_id)?.insert(slot, key, row)?;
            return Ok(InsertOutcome::Success);
        }

        let needed = self.pages_needed_for_split(page_id)?;
        if u64::from(self.pager.num_pages()) + needed > u64::from(self.pager.max_pages()) {
            debug!(key, needed, "table full");
            return Ok(InsertOutcome::TableFull);
        }

        self.split_leaf_and_insert(page_id, slot, key, row)?;
        Ok(InsertOutcome::Success)
    }

    /// Pages a split starting at the full leaf `leaf_id` will allocate: one
    /// per node that splits, plus one more if the root splits.
    fn pages_needed_for_split(&mut self, leaf_id: PageId) -> Result<u64> {
        let mut needed = 1;
        let mut page_id = leaf_id;

        loop {
            let page = self.existing_page(page_id)?;
            if node::is_root(page) {
                return Ok(needed + 1);
            }

            let parent_id = node::parent(page);
            if self.internal(parent_id)?.num_keys() < self.layout.max_internal_cells() {
                return Ok(needed);
            }

            needed += 1;
            page_id = parent_id;
        }
    }

    fn set_parent_of(&mut self, child: PageId, parent: PageId) -> Result<()> {
        node::set_parent(self.existing_page(child)?, parent);
        Ok(())
    }

    /// Splits the full leaf `leaf_id` while inserting `(key, row)` at `slot`.
    /// The lower cells stay on `leaf_id`; the upper cells move to a new leaf.
    fn split_leaf_and_insert(
        &mut self,
        leaf_id: PageId,
        slot: usize,
        key: u32,
        row: &Row,
    ) -> Result<()> {
        let layout = self.layout;

        let (mut cells, next_leaf, parent_id, was_root) = {
            let leaf = self.leaf(leaf_id)?;
            let cells = (0..leaf.num_cells())
                .map(|i| leaf.cell(i).map(<[u8]>::to_vec))
                .collect::<Result<Vec<_>>>()?;
            (cells, leaf.next_leaf(), leaf.parent(), leaf.is_root())
        };

        cells.insert(slot, encode_leaf_cell(&layout, key, row)?);
        let right_cells = cells.split_off(layout.leaf_left_split_count());

        let new_leaf_id = self.pager.get_unused_page_num();
        {
            let mut right = LeafNode::initialize(self.pager.get_page(new_leaf_id)?, layout)?;
            right.set_cells(&right_cells)?;
            right.set_parent(parent_id);
            right.set_next_leaf(next_leaf);
        }
        {
            let mut left = self.leaf(leaf_id)?;
            left.set_cells(&cells)?;
            left.set_next_leaf(Some(new_leaf_id));
        }

        debug!(
            left = leaf_id.as_u32(),
            right = new_leaf_id.as_u32(),
            key,
            "split leaf"
        );

        if was_root {
            self.split_root(new_leaf_id)
        } else {
            self.insert_into_parent(leaf_id, new_leaf_id)
        }
    }

    /// Registers `right_id`, the new upper half of `left_id`, with their
    /// parent. `left_id` gets a separator for its new maximum and the slot
    /// that used to point at it now points at `right_id`.
    fn insert_into_parent(&mut self, left_id: PageId, right_id: PageId) -> Result<()> {
        let parent_id = node::parent(self.existing_page(left_id)?);
        let left_max = self.node_max_key(left_id)?;

        let (index, num_keys) = {
            let parent = self.internal(parent_id)?;
            let index = parent.find_child_index(left_max)?;
            if parent.child(index)? != left_id {
                return Err(LeafDbError::CorruptNode(format!(
                    "parent {} does not route key {} to child {}",
                    parent_id, left_max, left_id
                )));
            }
            (index, parent.num_keys())
        };

        if num_keys < self.layout.max_internal_cells() {
            {
                let mut parent = self.internal(parent_id)?;
                parent.insert_cell(index, left_id, left_max)?;
                parent.set_child(index + 1, right_id)?;
            }
            return self.set_parent_of(right_id, parent_id);
        }

        self.split_internal_and_insert(parent_id, index, left_id, left_max, right_id)
    }

    /// Splits the full internal node `node_id` while adding the separator
    /// for `left_id` at `index` and repointing the following slot to
    /// `right_id`. Children are distributed by count; the odd one goes left.
    fn split_internal_and_insert(
        &mut self,
        node_id: PageId,
        index: usize,
        left_id: PageId,
        left_max: u32,
        right_id: PageId,
    ) -> Result<()> {
        let layout = self.layout;

        let (mut keys, mut children, was_root, parent_id) = {
            let node = self.internal(node_id)?;
            let (keys, children) = node.entries()?;
            (keys, children, node.is_root(), node.parent())
        };

        keys.insert(index, left_max);
        children.insert(index, left_id);
        children[index + 1] = right_id;

        // keys[split] is the max of the left half and moves up a level
        let split = layout.internal_left_split_count();
        let right_keys = keys.split_off(split + 1);
        keys.truncate(split);
        let right_children = children.split_off(split + 1);

        let new_node_id = self.pager.get_unused_page_num();
        {
            let mut right = InternalNode::initialize(self.pager.get_page(new_node_id)?, layout)?;
            right.set_entries(&right_keys, &right_children)?;
            right.set_parent(parent_id);
        }
        self.internal(node_id)?.set_entries(&keys, &children)?;

        for &child in &right_children {
            self.set_parent_of(child, new_node_id)?;
        }
        if !right_children.contains(&right_id) {
            self.set_parent_of(right_id, node_id)?;
        }

        debug!(
            left = node_id.as_u32(),
            right = new_node_id.as_u32(),
            left_keys = keys.len(),
            right_keys = right_keys.len(),
            "split internal node"
        );

        if was_root {
            self.split_root(new_node_id)
        } else {
            self.insert_into_parent(node_id, new_node_id)
        }
    }

    /// Grows the tree by one level after the root split off `right_id`.
    ///
    /// The old root's contents move to a fresh page that becomes the left
    /// child, and page 0 is reinitialized as an internal root with a single
    /// separator over the two halves.
    fn split_root(&mut self, right_id: PageId) -> Result<()> {
        let layout = self.layout;
        let root_id = self.root_page_id;

        let root_copy = self.existing_page(root_id)?.to_vec();
        let left_id = self.pager.get_unused_page_num();
        {
            let left = self.pager.get_page(left_id)?;
            left.copy_from_slice(&root_copy);
            node::set_root(left, false);
            node::set_parent(left, root_id);
        }

        if node::node_type(&root_copy)? == NodeType::Internal {
            let (_, children) = InternalNode::new(&root_copy[..], layout)?.entries()?;
            for child in children {
                self.set_parent_of(child, left_id)?;
            }
        }

        {
            let right = self.existing_page(right_id)?;
            node::set_root(right, false);
            node::set_parent(right, root_id);
        }

        let left_max = self.node_max_key(left_id)?;
        {
            let mut root = InternalNode::initialize(self.existing_page(root_id)?, layout)?;
            root.set_root(true);
            root.set_entries(&[left_max], &[left_id, right_id])?;
        }

        debug!(
            left = left_id.as_u32(),
            right = right_id.as_u32(),
            separator = left_max,
            "promoted new root"
        );
        Ok(())
    }
}
