//! Abstract tabular storage.
//!
//! Everything the ingestion pipeline needs from a backend is a named,
//! append-oriented table with a header row: get-or-create by name, row
//! count, append, and positional cell access. Both backends serialize the
//! count-then-write span of an append internally, so `append_rows` can be
//! treated as atomic by callers.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A single cell value. Tables hold text and integer counters only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    /// Integer reading of the cell; text parses leniently, defaulting to 0.
    pub fn as_int(&self) -> i64 {
        match self {
            Cell::Int(n) => *n,
            Cell::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Int(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

pub type Row = Vec<Cell>;

/// One logical table. Row and column indices are zero-based; row 0 is the
/// header when one has been written.
pub trait Table: Send + Sync {
    fn row_count(&self) -> Result<usize>;

    /// Append `rows` after the last existing row, returning the new row
    /// count. Atomic with respect to other appends on the same table; an
    /// empty slice touches nothing.
    fn append_rows(&self, rows: &[Row]) -> Result<usize>;

    fn read_cell(&self, row: usize, col: usize) -> Result<Option<Cell>>;

    fn write_cell(&self, row: usize, col: usize, value: Cell) -> Result<()>;

    /// Write `headers` as row 0. Callers only invoke this on an empty table.
    fn write_header(&self, headers: &[&str]) -> Result<()>;
}

/// A collection of named tables.
pub trait TableStore: Send + Sync {
    /// Get-or-create the named table. Idempotent: opening a table that
    /// already exists returns it, never errors.
    fn open_table(&self, name: &str) -> Result<Arc<dyn Table>>;

    /// Human-readable reference to where the data lives (reported back to
    /// callers as `sheetUrl`).
    fn location(&self) -> String;
}
