#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use super::util::{ColumnDecl, add_missing_columns};
use rusqlite::Connection;

/// Columns introduced after the first-generation `purchase_items` table.
const V2_COLUMNS: &[ColumnDecl] = &[
    ("requested_qty", "REAL"),
    ("received_qty", "REAL"),
    ("urgency", "TEXT"),
    ("issue", "INTEGER"),
    ("issue_type", "TEXT"),
    ("issue_reason", "TEXT"),
    ("quality_check", "TEXT"),
    ("notes", "TEXT"),
    ("status_timestamps_json", "TEXT"),
    ("history_json", "TEXT"),
    ("created_by", "TEXT"),
    ("updated_by", "TEXT"),
    ("updated_at_ms", "INTEGER"),
];

pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    add_missing_columns(conn, "purchase_items", V2_COLUMNS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_run_adds_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE purchase_items(id TEXT PRIMARY KEY, item_name TEXT NOT NULL, \
             quantity REAL, unit TEXT, supplier TEXT, status TEXT, notes TEXT);",
        )
        .unwrap();
        assert_eq!(
            add_missing_columns(&conn, "purchase_items", V2_COLUMNS).unwrap(),
            V2_COLUMNS.len() - 1
        );
        assert_eq!(add_missing_columns(&conn, "purchase_items", V2_COLUMNS).unwrap(), 0);
    }
}
