use std::collections::HashSet;

use crate::common::{LeafDbError, PageId, Result};

use super::node::NodeType;
use super::table::Table;

fn corrupt(msg: String) -> LeafDbError {
    LeafDbError::CorruptNode(msg)
}

/// Walk state shared across the recursive check.
#[derive(Default)]
struct Walk {
    visited: HashSet<PageId>,
    leaves: Vec<PageId>,
    leaf_depth: Option<usize>,
}

impl Table {
    /// Verifies the structural invariants of the whole tree.
    ///
    /// Checks key order within and across nodes, that every separator is the
    /// maximum of its child subtree, parent pointers and root flags, that all
    /// leaves sit at the same depth, and that the leaf chain visits the
    /// leaves in key order. Returns the first violation as
    /// [`LeafDbError::CorruptNode`].
    pub fn check_integrity(&mut self) -> Result<()> {
        let mut walk = Walk::default();
        let root = self.root_page_id();
        self.check_subtree(root, None, None, None, 1, &mut walk)?;

        let mut chain = Vec::with_capacity(walk.leaves.len());
        let mut next = walk.leaves.first().copied();
        while let Some(page_id) = next {
            if chain.len() > walk.leaves.len() {
                return Err(corrupt("leaf chain does not terminate".to_string()));
            }
            chain.push(page_id);
            next = self.leaf(page_id)?.next_leaf();
        }

        if chain != walk.leaves {
            return Err(corrupt(format!(
                "leaf chain {:?} does not match tree order {:?}",
                chain, walk.leaves
            )));
        }
        Ok(())
    }

    /// Checks the subtree at `page_id`, whose keys must lie in
    /// `(lower, upper]`, and returns its largest key.
    fn check_subtree(
        &mut self,
        page_id: PageId,
        parent: Option<PageId>,
        lower: Option<u32>,
        upper: Option<u32>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<Option<u32>> {
        if !walk.visited.insert(page_id) {
            return Err(corrupt(format!("{} is reachable twice", page_id)));
        }

        let in_range =
            |key: u32| lower.map_or(true, |lo| key > lo) && upper.map_or(true, |hi| key <= hi);

        match self.node_type(page_id)? {
            NodeType::Leaf => {
                let leaf = self.leaf(page_id)?;
                check_header(page_id, leaf.is_root(), leaf.parent(), parent)?;

                let mut prev = None;
                for i in 0..leaf.num_cells() {
                    let key = leaf.key(i)?;
                    if prev.map_or(false, |p| key <= p) {
                        return Err(corrupt(format!("keys out of order in leaf {}", page_id)));
                    }
                    if !in_range(key) {
                        return Err(corrupt(format!(
                            "key {} in leaf {} outside its parent's range",
                            key, page_id
                        )));
                    }
                    prev = Some(key);
                }
                if prev.is_none() && parent.is_some() {
                    return Err(corrupt(format!("non-root leaf {} is empty", page_id)));
                }

                match walk.leaf_depth {
                    Some(d) if d != depth => {
                        return Err(corrupt(format!(
                            "leaf {} at depth {}, expected {}",
                            page_id, depth, d
                        )));
                    }
                    _ => walk.leaf_depth = Some(depth),
                }
                walk.leaves.push(page_id);
                Ok(prev)
            }
            NodeType::Internal => {
                let (keys, children, is_root, stored_parent) = {
                    let node = self.internal(page_id)?;
                    let (keys, children) = node.entries()?;
                    (keys, children, node.is_root(), node.parent())
                };
                check_header(page_id, is_root, stored_parent, parent)?;

                if keys.is_empty() {
                    return Err(corrupt(format!("internal node {} has no keys", page_id)));
                }
                if keys.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(corrupt(format!("separators out of order in {}", page_id)));
                }

                let mut bound = lower;
                for (&key, &child) in keys.iter().zip(&children) {
                    if !in_range(key) {
                        return Err(corrupt(format!(
                            "separator {} in {} outside its parent's range",
                            key, page_id
                        )));
                    }
                    let max =
                        self.check_subtree(child, Some(page_id), bound, Some(key), depth + 1, walk)?;
                    if max != Some(key) {
                        return Err(corrupt(format!(
                            "separator {} in {} but child {} holds max {:?}",
                            key, page_id, child, max
                        )));
                    }
                    bound = Some(key);
                }

                let right = children[keys.len()];
                let max = self.check_subtree(right, Some(page_id), bound, upper, depth + 1, walk)?;
                if max.is_none() {
                    return Err(corrupt(format!("right child of {} is empty", page_id)));
                }
                Ok(max)
            }
        }
    }
}

fn check_header(
    page_id: PageId,
    is_root: bool,
    stored_parent: PageId,
    parent: Option<PageId>,
) -> Result<()> {
    match parent {
        None if !is_root => Err(corrupt(format!("root {} is not flagged as root", page_id))),
        Some(_) if is_root => Err(corrupt(format!("{} is wrongly flagged as root", page_id))),
        Some(expected) if stored_parent != expected => Err(corrupt(format!(
            "{} points to parent {}, expected {}",
            page_id, stored_parent, expected
        ))),
        _ => Ok(()),
    }
}
