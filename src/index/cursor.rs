use crate::common::{PageId, Result};
use crate::tuple::Row;

use super::table::Table;

/// A position in the table: a leaf page and a cell within it.
///
/// The cursor holds the table mutably for its lifetime, so the tree cannot
/// change underneath it.
pub struct Cursor<'a> {
    table: &'a mut Table,
    page_id: PageId,
    cell_num: usize,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        table: &'a mut Table,
        page_id: PageId,
        cell_num: usize,
        end_of_table: bool,
    ) -> Self {
        Self {
            table,
            page_id,
            cell_num,
            end_of_table,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// True once the cursor has moved past the last row.
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Key under the cursor, `None` if the cursor sits past the leaf's last
    /// cell.
    pub fn key(&mut self) -> Result<Option<u32>> {
        let leaf = self.table.leaf(self.page_id)?;
        if self.cell_num >= leaf.num_cells() {
            return Ok(None);
        }
        leaf.key(self.cell_num).map(Some)
    }

    /// Row under the cursor.
    pub fn row(&mut self) -> Result<Row> {
        self.table.leaf(self.page_id)?.row(self.cell_num)
    }

    /// Raw row bytes under the cursor, writable in place.
    pub fn value_mut(&mut self) -> Result<&mut [u8]> {
        self.table.leaf(self.page_id)?.into_value_mut(self.cell_num)
    }

    /// Overwrites the row under the cursor. The key stays as it is.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        row.serialize(self.value_mut()?)
    }

    /// Moves to the next cell, following the leaf chain when the current
    /// leaf is exhausted.
    pub fn advance(&mut self) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }

        let (num_cells, next_leaf) = {
            let leaf = self.table.leaf(self.page_id)?;
            (leaf.num_cells(), leaf.next_leaf())
        };

        self.cell_num += 1;
        if self.cell_num >= num_cells {
            match next_leaf {
                Some(next) => {
                    self.page_id = next;
                    self.cell_num = 0;
                }
                None => self.end_of_table = true,
            }
        }
        Ok(())
    }
}

/// Rows in ascending key order, from a cursor at the start of the table.
pub struct Scan<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Scan<'a> {
    pub(crate) fn new(cursor: Cursor<'a>) -> Self {
        Self { cursor }
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_end() {
            return None;
        }

        let row = self.cursor.row().and_then(|row| {
            self.cursor.advance()?;
            Ok(row)
        });
        if row.is_err() {
            self.cursor.end_of_table = true;
        }
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{LeafDbError, TableConfig};
    use tempfile::NamedTempFile;

    fn row(id: u32) -> Row {
        Row::new(id, &format!("user{}", id), &format!("person{}@example.com", id)).unwrap()
    }

    fn table_with(path: &std::path::Path, keys: &[u32]) -> Table {
        let config = TableConfig::new().with_page_size(1024);
        let mut table = Table::open_with_config(path, config).unwrap();
        for &key in keys {
            table.insert(key, &row(key)).unwrap();
        }
        table
    }

    #[test]
    fn test_start_of_empty_table_is_end() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut table = table_with(temp_file.path(), &[]);

        let cursor = table.start().unwrap();
        assert!(cursor.is_end());
        assert_eq!(table.scan().unwrap().count(), 0);
    }

    #[test]
    fn test_advance_crosses_leaves() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut table = table_with(temp_file.path(), &[1, 2, 3, 4, 5]);

        let mut cursor = table.start().unwrap();
        let mut keys = Vec::new();
        while !cursor.is_end() {
            keys.push(cursor.key().unwrap().unwrap());
            cursor.advance().unwrap();
        }
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);

        // Stays put once at the end
        cursor.advance().unwrap();
        assert!(cursor.is_end());
    }

    #[test]
    fn test_end_cursor() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut table = table_with(temp_file.path(), &[1, 2, 3, 4, 5]);

        let mut cursor = table.end().unwrap();
        assert!(cursor.is_end());
        assert_eq!(cursor.key().unwrap(), None);
        assert!(cursor.row().is_err());
    }

    #[test]
    fn test_find_positions() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut table = table_with(temp_file.path(), &[10, 20, 30]);

        let mut cursor = table.find(20).unwrap();
        assert_eq!(cursor.cell_num(), 1);
        assert_eq!(cursor.key().unwrap(), Some(20));

        let mut cursor = table.find(25).unwrap();
        assert_eq!(cursor.cell_num(), 2);
        assert_eq!(cursor.key().unwrap(), Some(30));
        drop(cursor);

        let cursor = table.find(99).unwrap();
        assert_eq!(cursor.cell_num(), 3);
        assert!(cursor.is_end());
    }

    #[test]
    fn test_write_row_in_place() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut table = table_with(temp_file.path(), &[1, 2]);

        let updated = Row::new(2, "renamed", "new@example.com").unwrap();
        table.find(2).unwrap().write_row(&updated).unwrap();
        assert_eq!(table.get(2).unwrap(), Some(updated));

        let mut cursor = table.find(3).unwrap();
        assert!(matches!(
            cursor.value_mut(),
            Err(LeafDbError::CellOutOfRange { index: 2, count: 2 })
        ));
    }
}
