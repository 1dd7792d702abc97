//! SQLite-backed table store.
//!
//! Tables are stored as sparse cells keyed by `(sheet, row, col)`, which
//! keeps positional semantics (header row, append-after-last, direct cell
//! writes) identical to the in-memory backend. One connection behind a
//! mutex serializes every count-then-write span.

use super::{Cell, Row, Table, TableStore};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let conn = Connection::open(path).context("Failed to open storage database")?;
        migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: format!("sqlite://{}", path.display()),
        })
    }

    /// Private in-memory database, handy in tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: "sqlite://:memory:".to_string(),
        })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheets (
            name TEXT PRIMARY KEY
        )",
        [],
    )
    .context("Failed to create sheets table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cells (
            sheet TEXT NOT NULL,
            row_idx INTEGER NOT NULL,
            col_idx INTEGER NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (sheet, row_idx, col_idx)
        )",
        [],
    )
    .context("Failed to create cells table")?;

    Ok(())
}

impl TableStore for SqliteStore {
    fn open_table(&self, name: &str) -> Result<Arc<dyn Table>> {
        let conn = lock(&self.conn)?;
        conn.execute("INSERT OR IGNORE INTO sheets (name) VALUES (?1)", [name])
            .context("Failed to register sheet")?;
        drop(conn);

        Ok(Arc::new(SqliteTable {
            name: name.to_string(),
            conn: self.conn.clone(),
        }))
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

struct SqliteTable {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTable {
    fn count(&self, conn: &Connection) -> Result<usize> {
        let count: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(row_idx) + 1, 0) FROM cells WHERE sheet = ?1",
                [&self.name],
                |row| row.get(0),
            )
            .context("Failed to count rows")?;
        Ok(count as usize)
    }

    fn put_cell(&self, conn: &Connection, row: usize, col: usize, value: &Cell) -> Result<()> {
        let encoded = serde_json::to_string(value).context("Failed to encode cell")?;
        conn.execute(
            "INSERT OR REPLACE INTO cells (sheet, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)",
            params![self.name, row as i64, col as i64, encoded],
        )
        .context("Failed to write cell")?;
        Ok(())
    }
}

impl Table for SqliteTable {
    fn row_count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        self.count(&conn)
    }

    fn append_rows(&self, rows: &[Row]) -> Result<usize> {
        if rows.is_empty() {
            let conn = lock(&self.conn)?;
            return self.count(&conn);
        }

        // The lock is held across count and insert, so the row range of one
        // append cannot overlap another's.
        let mut conn = lock(&self.conn)?;
        let start = self.count(&conn)?;

        let tx = conn.transaction().context("Failed to begin transaction")?;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let encoded = serde_json::to_string(cell).context("Failed to encode cell")?;
                tx.execute(
                    "INSERT OR REPLACE INTO cells (sheet, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)",
                    params![self.name, (start + r) as i64, c as i64, encoded],
                )
                .context("Failed to append cell")?;
            }
        }
        tx.commit().context("Failed to commit append")?;

        Ok(start + rows.len())
    }

    fn read_cell(&self, row: usize, col: usize) -> Result<Option<Cell>> {
        let conn = lock(&self.conn)?;
        let encoded: Option<String> = conn
            .query_row(
                "SELECT value FROM cells WHERE sheet = ?1 AND row_idx = ?2 AND col_idx = ?3",
                params![self.name, row as i64, col as i64],
                |r| r.get(0),
            )
            .optional()
            .context("Failed to read cell")?;

        match encoded {
            Some(text) => {
                let cell = serde_json::from_str(&text).context("Failed to decode cell")?;
                Ok(Some(cell))
            }
            None => Ok(None),
        }
    }

    fn write_cell(&self, row: usize, col: usize, value: Cell) -> Result<()> {
        let conn = lock(&self.conn)?;
        self.put_cell(&conn, row, col, &value)
    }

    fn write_header(&self, headers: &[&str]) -> Result<()> {
        let conn = lock(&self.conn)?;
        for (c, header) in headers.iter().enumerate() {
            self.put_cell(&conn, 0, c, &Cell::from(*header))?;
        }
        Ok(())
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| anyhow!("storage mutex poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn migrate_creates_tables() {
        let store = setup();
        let conn = store.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('sheets', 'cells')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn append_and_count() {
        let store = setup();
        let table = store.open_table("records").unwrap();

        assert_eq!(table.row_count().unwrap(), 0);

        let count = table
            .append_rows(&[
                vec![Cell::from("a"), Cell::Int(1)],
                vec![Cell::from("b"), Cell::Int(2)],
            ])
            .unwrap();
        assert_eq!(count, 2);

        let count = table.append_rows(&[vec![Cell::from("c")]]).unwrap();
        assert_eq!(count, 3);
        assert_eq!(table.read_cell(2, 0).unwrap(), Some(Cell::from("c")));
    }

    #[test]
    fn cells_round_trip_types() {
        let store = setup();
        let table = store.open_table("t").unwrap();

        table.write_cell(1, 1, Cell::Int(42)).unwrap();
        table.write_cell(1, 2, Cell::from("hello")).unwrap();

        assert_eq!(table.read_cell(1, 1).unwrap(), Some(Cell::Int(42)));
        assert_eq!(table.read_cell(1, 2).unwrap(), Some(Cell::from("hello")));
        assert_eq!(table.read_cell(0, 0).unwrap(), None);
    }

    #[test]
    fn header_counts_as_a_row() {
        let store = setup();
        let table = store.open_table("t").unwrap();

        table.write_header(&["x", "y"]).unwrap();
        assert_eq!(table.row_count().unwrap(), 1);
        assert_eq!(table.read_cell(0, 0).unwrap(), Some(Cell::from("x")));
    }

    #[test]
    fn tables_are_isolated_by_name() {
        let store = setup();
        let a = store.open_table("a").unwrap();
        let b = store.open_table("b").unwrap();

        a.append_rows(&[vec![Cell::from("only a")]]).unwrap();
        assert_eq!(a.row_count().unwrap(), 1);
        assert_eq!(b.row_count().unwrap(), 0);
    }
}
