#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError};
use kb_core::{IssueType, ItemId, PurchaseRecord, RecordId, RecordStatus, TimestampMs};
use rusqlite::{Row, params};

const SELECT_RECORDS: &str = "SELECT record_id, item_id, item_name, supplier, quantity, unit, \
     status, issue_type, issue_reason, receiver, created_at_ms FROM purchase_history";

struct RawRecord {
    record_id: String,
    item_id: String,
    item_name: String,
    supplier: String,
    quantity: f64,
    unit: String,
    status: String,
    issue_type: Option<String>,
    issue_reason: Option<String>,
    receiver: Option<String>,
    created_at_ms: TimestampMs,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        record_id: row.get(0)?,
        item_id: row.get(1)?,
        item_name: row.get(2)?,
        supplier: row.get(3)?,
        quantity: row.get(4)?,
        unit: row.get(5)?,
        status: row.get(6)?,
        issue_type: row.get(7)?,
        issue_reason: row.get(8)?,
        receiver: row.get(9)?,
        created_at_ms: row.get(10)?,
    })
}

impl TryFrom<RawRecord> for PurchaseRecord {
    type Error = StoreError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let id = RecordId::try_new(raw.record_id.clone())
            .map_err(|err| StoreError::corrupt(raw.record_id.clone(), err))?;
        let item_id = ItemId::try_new(raw.item_id)
            .map_err(|err| StoreError::corrupt(raw.record_id.clone(), err))?;
        let status = raw
            .status
            .parse::<RecordStatus>()
            .map_err(|err| StoreError::corrupt(raw.record_id.clone(), err))?;
        let issue_type = raw
            .issue_type
            .as_deref()
            .map(str::parse::<IssueType>)
            .transpose()
            .map_err(|err| StoreError::corrupt(raw.record_id.clone(), err))?;
        Ok(PurchaseRecord {
            id,
            item_id,
            item_name: raw.item_name,
            supplier: raw.supplier,
            quantity: raw.quantity,
            unit: raw.unit,
            status,
            issue_type,
            issue_reason: raw.issue_reason,
            receiver: raw.receiver,
            recorded_at: raw.created_at_ms,
        })
    }
}

impl SqliteStore {
    /// Appends a record and returns its row id. Appending the same record
    /// twice keeps the first row and returns its id.
    pub fn append_purchase_record(&mut self, record: &PurchaseRecord) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO purchase_history(record_id, item_id, item_name, supplier, quantity, unit, \
               status, issue_type, issue_reason, receiver, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(record_id) DO NOTHING",
            params![
                record.id.as_str(),
                record.item_id.as_str(),
                record.item_name,
                record.supplier,
                record.quantity,
                record.unit,
                record.status.as_str(),
                record.issue_type.map(|kind| kind.as_str()),
                record.issue_reason,
                record.receiver,
                record.recorded_at,
            ],
        )?;
        let row_id = tx.query_row(
            "SELECT id FROM purchase_history WHERE record_id = ?1",
            params![record.id.as_str()],
            |row| row.get::<_, i64>(0),
        )?;
        tx.commit()?;
        tracing::debug!(record = %record.id, row_id, "purchase record appended");
        Ok(row_id)
    }

    /// Only a quick-receive undo removes history. Returns whether a row existed.
    pub fn remove_purchase_record(&mut self, id: &RecordId) -> Result<bool, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM purchase_history WHERE record_id = ?1",
            params![id.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// All records in append order.
    pub fn list_purchase_records(&self) -> Result<Vec<PurchaseRecord>, StoreError> {
        self.query_records(&format!("{SELECT_RECORDS} ORDER BY id ASC"), None)
    }

    pub fn list_purchase_records_since(
        &self,
        since_ms: TimestampMs,
    ) -> Result<Vec<PurchaseRecord>, StoreError> {
        self.query_records(
            &format!("{SELECT_RECORDS} WHERE created_at_ms >= ?1 ORDER BY id ASC"),
            Some(since_ms),
        )
    }

    fn query_records(
        &self,
        sql: &str,
        since_ms: Option<TimestampMs>,
    ) -> Result<Vec<PurchaseRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let raws = match since_ms {
            Some(since) => stmt
                .query_map(params![since], read_raw)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], read_raw)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        let mut records = Vec::with_capacity(raws.len());
        for raw in raws {
            match PurchaseRecord::try_from(raw) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable purchase record"),
            }
        }
        Ok(records)
    }
}
