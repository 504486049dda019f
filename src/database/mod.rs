//! Table lifecycle and statement execution.


use std::path::Path;

use thiserror::Error;

use crate::btree::{self, node, BTreeError, Cursor};
use crate::record::Row;
use crate::storage::{PageNum, Pager, PagerError};

/// The root node always lives on page 0.
pub const ROOT_PAGE_NUM: PageNum = 0;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Pager error: {0}")]
    Pager(#[from] PagerError),

    #[error("B-tree error: {0}")]
    BTree(#[from] BTreeError),
}

pub type TableResult<T> = Result<T, TableError>;

/// Errors surfaced at the statement boundary. The `Display` strings are
/// what the REPL prints after an `Error: ` prefix.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Duplicate key.")]
    DuplicateKey,

    #[error("Table full.")]
    TableFull,

    #[error("{0}")]
    Tree(BTreeError),
}

impl From<BTreeError> for ExecuteError {
    fn from(err: BTreeError) -> Self {
        match err {
            // Both mean the file cannot host another page in this core.
            BTreeError::NonRootSplit => ExecuteError::TableFull,
            BTreeError::Pager(PagerError::PageOutOfBounds(..)) => ExecuteError::TableFull,
            other => ExecuteError::Tree(other),
        }
    }
}

impl From<PagerError> for ExecuteError {
    fn from(err: PagerError) -> Self {
        ExecuteError::from(BTreeError::Pager(err))
    }
}

/// A single open table: the pager plus the fixed root page number.
pub struct Table {
    root_page_num: PageNum,
    pager: Pager,
}

impl Table {
    /// Open the database file, initializing an empty root leaf on a fresh
    /// file.
    pub fn open<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        let mut pager = Pager::open(path)?;

        if pager.num_pages() == 0 {
            let root = pager.get_page(ROOT_PAGE_NUM)?;
            node::initialize_leaf_node(root);
            node::set_root(root, true);
        }

        Ok(Self {
            root_page_num: ROOT_PAGE_NUM,
            pager,
        })
    }

    /// Flush every cached page and close the file.
    pub fn close(&mut self) -> TableResult<()> {
        self.pager.close()?;
        Ok(())
    }

    /// Insert a row, keyed by its id. Duplicate ids are rejected without
    /// touching the tree.
    pub fn insert(&mut self, row: &Row) -> Result<(), ExecuteError> {
        let key = row.id;
        let cursor = btree::table_find(&mut self.pager, self.root_page_num, key)?;

        let leaf = self.pager.get_page(cursor.page_num)?;
        let num_cells = node::leaf_num_cells(leaf);
        if cursor.cell_num < num_cells && node::leaf_key(leaf, cursor.cell_num) == key {
            return Err(ExecuteError::DuplicateKey);
        }

        btree::leaf_node_insert(&mut self.pager, self.root_page_num, &cursor, key, row)?;
        Ok(())
    }

    /// All rows in ascending key order.
    pub fn select(&mut self) -> Result<Vec<Row>, ExecuteError> {
        self.scan()?.collect()
    }

    /// Iterate rows in ascending key order.
    pub fn scan(&mut self) -> Result<TableScan<'_>, ExecuteError> {
        let cursor = btree::table_start(&mut self.pager, self.root_page_num)?;
        Ok(TableScan {
            root_page_num: self.root_page_num,
            pager: &mut self.pager,
            cursor,
        })
    }

    /// The `.btree` dump of the whole tree.
    pub fn render_tree(&mut self) -> Result<String, ExecuteError> {
        Ok(btree::render_tree(&mut self.pager, self.root_page_num)?)
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        // Best-effort flush; `.exit` reports close errors explicitly.
        let _ = self.pager.close();
    }
}

/// Cursor-driven scan over a table's rows.
pub struct TableScan<'a> {
    root_page_num: PageNum,
    pager: &'a mut Pager,
    cursor: Cursor,
}

impl Iterator for TableScan<'_> {
    type Item = Result<Row, ExecuteError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.end_of_table {
            return None;
        }

        let row = match btree::cursor_value(self.pager, &self.cursor) {
            Ok(slot) => Row::deserialize(slot),
            Err(err) => return Some(Err(err.into())),
        };
        if let Err(err) = btree::cursor_advance(self.pager, self.root_page_num, &mut self.cursor) {
            return Some(Err(err.into()));
        }

        Some(Ok(row))
    }
}
