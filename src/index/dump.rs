use crate::common::{LeafDbError, PageId, Result};

use super::node::NodeType;
use super::table::Table;

impl Table {
    /// Renders the tree shape for debugging: one line per node, leaf key and
    /// separator, indented by depth.
    ///
    /// ```text
    /// - internal (size 1)
    ///   - leaf (size 2)
    ///     - 1
    ///     - 2
    ///   - key 2
    ///   - leaf (size 1)
    ///     - 3
    /// ```
    pub fn dump_tree(&mut self) -> Result<String> {
        let mut out = String::new();
        let root = self.root_page_id();
        self.dump_node(root, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(&mut self, page_id: PageId, level: usize, out: &mut String) -> Result<()> {
        if level > self.num_pages() as usize {
            return Err(LeafDbError::CorruptNode(
                "tree descent does not terminate".to_string(),
            ));
        }
        let indent = "  ".repeat(level);

        match self.node_type(page_id)? {
            NodeType::Leaf => {
                let leaf = self.leaf(page_id)?;
                out.push_str(&format!("{}- leaf (size {})\n", indent, leaf.num_cells()));
                for i in 0..leaf.num_cells() {
                    out.push_str(&format!("{}  - {}\n", indent, leaf.key(i)?));
                }
            }
            NodeType::Internal => {
                let (keys, children) = self.internal(page_id)?.entries()?;
                out.push_str(&format!("{}- internal (size {})\n", indent, keys.len()));
                for (&key, &child) in keys.iter().zip(&children) {
                    self.dump_node(child, level + 1, out)?;
                    out.push_str(&format!("{}  - key {}\n", indent, key));
                }
                self.dump_node(children[keys.len()], level + 1, out)?;
            }
        }
        Ok(())
    }
}
