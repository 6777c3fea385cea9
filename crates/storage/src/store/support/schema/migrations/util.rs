#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use rusqlite::Connection;
use std::collections::HashSet;

/// Column name and SQL type, as written after `ADD COLUMN`.
pub(super) type ColumnDecl = (&'static str, &'static str);

fn existing_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

/// Adds whichever of `columns` the table lacks. Never drops or retypes a
/// column, so running it on any generation of the table is safe.
pub(super) fn add_missing_columns(
    conn: &Connection,
    table: &str,
    columns: &[ColumnDecl],
) -> Result<usize, StoreError> {
    let present = existing_columns(conn, table)?;
    let mut added = 0;
    for (column, decl) in columns {
        if present.contains(*column) {
            continue;
        }
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"), [])?;
        added += 1;
    }
    if added > 0 {
        tracing::info!(table, added, "schema columns added");
    }
    Ok(added)
}
