//! In-memory table store, used by the test suite and by embedders that want
//! a throwaway backend.

use super::{Cell, Row, Table, TableStore};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Tables = HashMap<String, Vec<Row>>;

#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryStore {
    fn open_table(&self, name: &str) -> Result<Arc<dyn Table>> {
        lock(&self.inner)?.entry(name.to_string()).or_default();
        Ok(Arc::new(MemoryTable {
            name: name.to_string(),
            inner: self.inner.clone(),
        }))
    }

    fn location(&self) -> String {
        "memory://meetsink".to_string()
    }
}

struct MemoryTable {
    name: String,
    inner: Arc<Mutex<Tables>>,
}

impl MemoryTable {
    fn with_rows<T>(&self, f: impl FnOnce(&mut Vec<Row>) -> T) -> Result<T> {
        let mut tables = lock(&self.inner)?;
        let rows = tables
            .get_mut(&self.name)
            .ok_or_else(|| anyhow!("table {} disappeared", self.name))?;
        Ok(f(rows))
    }
}

impl Table for MemoryTable {
    fn row_count(&self) -> Result<usize> {
        self.with_rows(|rows| rows.len())
    }

    fn append_rows(&self, new_rows: &[Row]) -> Result<usize> {
        // Count-then-write happens under a single lock acquisition, so
        // concurrent appends cannot interleave row ranges.
        self.with_rows(|rows| {
            rows.extend_from_slice(new_rows);
            rows.len()
        })
    }

    fn read_cell(&self, row: usize, col: usize) -> Result<Option<Cell>> {
        self.with_rows(|rows| rows.get(row).and_then(|r| r.get(col)).cloned())
    }

    fn write_cell(&self, row: usize, col: usize, value: Cell) -> Result<()> {
        self.with_rows(|rows| {
            while rows.len() <= row {
                rows.push(Vec::new());
            }
            let cells = &mut rows[row];
            while cells.len() <= col {
                cells.push(Cell::empty());
            }
            cells[col] = value;
        })
    }

    fn write_header(&self, headers: &[&str]) -> Result<()> {
        let header: Row = headers.iter().map(|h| Cell::from(*h)).collect();
        self.with_rows(|rows| {
            if rows.is_empty() {
                rows.push(header);
            } else {
                rows[0] = header;
            }
        })
    }
}

fn lock(inner: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
    inner.lock().map_err(|_| anyhow!("store mutex poisoned"))
}
