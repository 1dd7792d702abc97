//! Table provisioning and appending.

use crate::store::{Row, Table, TableStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Get-or-create the named table and, if it is empty, write the header row.
/// A table that already has rows keeps its existing header untouched, even
/// when `headers` differs: column order is fixed forever at first write.
pub fn ensure_table(
    store: &dyn TableStore,
    name: &str,
    headers: &[&str],
) -> Result<Arc<dyn Table>> {
    let table = store.open_table(name)?;
    if table.row_count()? == 0 {
        debug!("provisioning header row for table {}", name);
        table.write_header(headers)?;
    }
    Ok(table)
}

/// Append `rows` after the last existing row, returning the new row count.
/// An empty row list touches nothing.
pub fn append(table: &dyn Table, rows: &[Row]) -> Result<usize> {
    if rows.is_empty() {
        return table.row_count();
    }
    table.append_rows(rows)
}
