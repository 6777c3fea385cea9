#![forbid(unsafe_code)]

use super::support::{history_json, now_ms, parse_history, parse_timestamps, timestamps_json};
use super::{SqliteStore, StoreError, is_missing_column};
use kb_core::{ItemId, ItemRow, ProcurementItem, TimestampMs, normalize_legacy};
use rusqlite::{Connection, Row, params};

const FULL_SELECT: &str = "SELECT id, item_name, quantity, unit, supplier, status, \
     requested_qty, received_qty, urgency, issue, issue_type, issue_reason, quality_check, \
     notes, status_timestamps_json, history_json, created_by, updated_by, updated_at_ms \
     FROM purchase_items";

const MINIMAL_SELECT: &str =
    "SELECT id, item_name, quantity, unit, supplier, status FROM purchase_items";

impl SqliteStore {
    /// Every item, newest first, normalized from whatever schema version wrote it.
    /// Rows that cannot be normalized are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<ProcurementItem>, StoreError> {
        let items = load_items(&self.conn, now_ms())?;
        tracing::info!(items = items.len(), "items loaded");
        Ok(items)
    }

    pub fn get_item(&self, id: &ItemId) -> Result<ProcurementItem, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FULL_SELECT} WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id.as_str()], read_full_row)?;
        let Some(row) = rows.next() else {
            return Err(StoreError::UnknownId);
        };
        let row = row?;
        normalize_legacy(row, now_ms()).map_err(|err| StoreError::corrupt(id.as_str(), err))
    }

    pub fn upsert_item(&mut self, item: &ProcurementItem) -> Result<(), StoreError> {
        upsert_item_conn(&self.conn, item)
    }

    /// Returns whether a row was removed.
    pub fn delete_item(&mut self, id: &ItemId) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM purchase_items WHERE id = ?1", params![id.as_str()])?;
        Ok(removed > 0)
    }
}

pub(super) fn load_items(
    conn: &Connection,
    fallback_now_ms: TimestampMs,
) -> Result<Vec<ProcurementItem>, StoreError> {
    let rows = match select_rows(conn, FULL_SELECT, read_full_row) {
        Ok(rows) => rows,
        Err(StoreError::Sql(err)) if is_missing_column(&err) => {
            tracing::warn!(error = %err, "items table predates v2 columns; reading minimal set");
            select_rows(conn, MINIMAL_SELECT, read_minimal_row)?
        }
        Err(err) => return Err(err),
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id.clone();
        match normalize_legacy(row, fallback_now_ms) {
            Ok(item) => items.push(item),
            Err(err) => tracing::warn!(item = %id, error = %err, "skipping unreadable item row"),
        }
    }
    items.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    Ok(items)
}

fn select_rows(
    conn: &Connection,
    sql: &str,
    read: fn(&Row<'_>) -> rusqlite::Result<ItemRow>,
) -> Result<Vec<ItemRow>, StoreError> {
    let mut stmt = conn.prepare(&format!("{sql} ORDER BY rowid DESC"))?;
    let rows = stmt
        .query_map([], read)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn read_minimal_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        unit: row.get(3)?,
        supplier: row.get(4)?,
        status: row.get(5)?,
        ..ItemRow::default()
    })
}

fn read_full_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    let mut out = read_minimal_row(row)?;
    out.quantity_requested = row.get(6)?;
    out.quantity_received = row.get(7)?;
    out.urgency = row.get(8)?;
    out.issue = row.get::<_, Option<i64>>(9)?.map(|flag| flag != 0);
    out.issue_type = row.get(10)?;
    out.issue_reason = row.get(11)?;
    out.quality_check = row.get(12)?;
    out.notes = row.get(13)?;
    out.status_timestamps = parse_timestamps(&out.id, row.get(14)?);
    out.history = parse_history(&out.id, row.get(15)?);
    out.created_by = row.get(16)?;
    out.updated_by = row.get(17)?;
    out.last_updated = row.get(18)?;
    Ok(out)
}

/// Writes every column, falling back to the first-generation set when the
/// table has not been migrated. The name is written either way.
pub(super) fn upsert_item_conn(conn: &Connection, item: &ProcurementItem) -> Result<(), StoreError> {
    match upsert_full(conn, item) {
        Err(StoreError::Sql(err)) if is_missing_column(&err) => {
            tracing::warn!(item = %item.id, error = %err, "writing minimal column set");
            upsert_minimal(conn, item)
        }
        other => other,
    }
}

fn upsert_full(conn: &Connection, item: &ProcurementItem) -> Result<(), StoreError> {
    let stamps = timestamps_json(&item.status_timestamps)?;
    let history = history_json(&item.history)?;
    conn.execute(
        "INSERT INTO purchase_items(id, item_name, quantity, unit, supplier, status, \
           requested_qty, received_qty, urgency, issue, issue_type, issue_reason, quality_check, \
           notes, status_timestamps_json, history_json, created_by, updated_by, updated_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19) \
         ON CONFLICT(id) DO UPDATE SET \
           item_name = excluded.item_name, quantity = excluded.quantity, unit = excluded.unit, \
           supplier = excluded.supplier, status = excluded.status, \
           requested_qty = excluded.requested_qty, received_qty = excluded.received_qty, \
           urgency = excluded.urgency, issue = excluded.issue, issue_type = excluded.issue_type, \
           issue_reason = excluded.issue_reason, quality_check = excluded.quality_check, \
           notes = excluded.notes, status_timestamps_json = excluded.status_timestamps_json, \
           history_json = excluded.history_json, created_by = excluded.created_by, \
           updated_by = excluded.updated_by, updated_at_ms = excluded.updated_at_ms",
        params![
            item.id.as_str(),
            item.name,
            item.quantity_requested,
            item.unit,
            item.supplier,
            item.status.as_str(),
            item.quantity_requested,
            item.quantity_received,
            item.urgency.as_str(),
            i64::from(item.issue),
            item.issue_type.map(|kind| kind.as_str()),
            item.issue_reason,
            item.quality_check.map(|check| check.as_str()),
            item.notes,
            stamps,
            history,
            item.created_by,
            item.updated_by,
            item.last_updated,
        ],
    )?;
    Ok(())
}

fn upsert_minimal(conn: &Connection, item: &ProcurementItem) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO purchase_items(id, item_name, quantity, unit, supplier, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(id) DO UPDATE SET \
           item_name = excluded.item_name, quantity = excluded.quantity, unit = excluded.unit, \
           supplier = excluded.supplier, status = excluded.status",
        params![
            item.id.as_str(),
            item.name,
            item.quantity_requested,
            item.unit,
            item.supplier,
            item.status.as_str(),
        ],
    )?;
    Ok(())
}
