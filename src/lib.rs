//! LeafDB - a single-file, single-table B-tree storage engine
//!
//! Rows are keyed by a `u32` and stored in the leaves of a B-tree whose
//! nodes are fixed-size pages of one file. Pages are cached in memory once
//! touched and written back when the table is closed.
//!
//! # Architecture
//!
//! - **Storage Layer** (`storage`): Raw page I/O against the database file
//!   - `DiskManager`: Reads and writes whole pages at page-aligned offsets
//!
//! - **Page Cache** (`buffer`): In-memory page slots
//!   - `PageStore`: Loads pages on first access and flushes them on close
//!
//! - **Rows** (`tuple`): The fixed-width `Row` record and its byte codec
//!
//! - **Index** (`index`): The B-tree itself
//!   - `LeafNode`/`InternalNode`: Typed views over node pages
//!   - `Table`: Lookup, insertion, node splits and root promotion
//!   - `Cursor`/`Scan`: Positioned access and in-order iteration
//!
//! # Example
//!
//! ```rust,no_run
//! use leafdb::{InsertOutcome, Row, Table};
//!
//! let mut table = Table::open("users.db").unwrap();
//!
//! let row = Row::new(1, "alice", "alice@example.com").unwrap();
//! assert_eq!(table.insert(1, &row).unwrap(), InsertOutcome::Success);
//!
//! for row in table.scan().unwrap() {
//!     println!("{}", row.unwrap());
//! }
//!
//! // Nothing reaches the file until close
//! table.close().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{InsertOutcome, LeafDbError, PageId, Result, TableConfig};
pub use index::{Cursor, Scan, Table};
pub use tuple::Row;
