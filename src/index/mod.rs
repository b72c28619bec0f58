mod cursor;
mod dump;
mod integrity;
pub mod layout;
pub mod node;
mod table;

pub use cursor::{Cursor, Scan};
pub use layout::NodeLayout;
pub use node::{encode_leaf_cell, InternalNode, LeafNode, NodeType};
pub use table::Table;
