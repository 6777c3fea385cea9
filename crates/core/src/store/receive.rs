#![forbid(unsafe_code)]

use super::ItemStore;
use crate::detect::detect_issue_status;
use crate::error::BoardError;
use crate::ids::{ItemId, RecordId};
use crate::model::{
    HistoryEntry, IssueType, ProcurementItem, PurchaseRecord, QualityCheck, RecordStatus, Status,
    StatusTimestamps, TimestampMs,
};
use serde::Serialize;

/// Result of a terminal receiving step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Receipt {
    pub item: ProcurementItem,
    pub record: PurchaseRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoOutcome {
    pub item: ProcurementItem,
    pub removed_record: RecordId,
}

/// Fields a quick receive overwrites, captured so it can be reversed.
#[derive(Clone, Debug)]
struct Before {
    status: Status,
    quantity_received: f64,
    quality_check: Option<QualityCheck>,
    issue: bool,
    issue_type: Option<IssueType>,
    issue_reason: Option<String>,
    status_timestamps: StatusTimestamps,
    history: Vec<HistoryEntry>,
    last_updated: TimestampMs,
    updated_by: Option<String>,
}

impl Before {
    fn capture(item: &ProcurementItem) -> Self {
        Self {
            status: item.status,
            quantity_received: item.quantity_received,
            quality_check: item.quality_check,
            issue: item.issue,
            issue_type: item.issue_type,
            issue_reason: item.issue_reason.clone(),
            status_timestamps: item.status_timestamps.clone(),
            history: item.history.clone(),
            last_updated: item.last_updated,
            updated_by: item.updated_by.clone(),
        }
    }

    fn restore(self, item: &mut ProcurementItem) {
        item.status = self.status;
        item.quantity_received = self.quantity_received;
        item.quality_check = self.quality_check;
        item.issue = self.issue;
        item.issue_type = self.issue_type;
        item.issue_reason = self.issue_reason;
        item.status_timestamps = self.status_timestamps;
        item.history = self.history;
        item.last_updated = self.last_updated;
        item.updated_by = self.updated_by;
    }
}

/// The single pending quick-receive undo.
#[derive(Clone, Debug)]
pub(super) struct UndoSlot {
    pub(super) item_id: ItemId,
    record_id: RecordId,
    before: Before,
    taken_at: TimestampMs,
}

impl ItemStore {
    /// Marks a bought item fully received with quality OK and appends an `OK`
    /// record. Stops at `received`; verification is a separate step.
    pub fn quick_receive(
        &mut self,
        id: &ItemId,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<Receipt, BoardError> {
        let index = self.index_of(id)?;
        let cap = self.settings.history_cap;
        let item = &mut self.items[index];
        if item.status != Status::Bought {
            return Err(BoardError::QuickReceiveNotEligible {
                id: id.clone(),
                reason: "item is not in bought",
            });
        }
        if detect_issue_status(item) {
            return Err(BoardError::QuickReceiveNotEligible {
                id: id.clone(),
                reason: "item has an open issue",
            });
        }
        if item.quantity_requested <= 0.0 {
            return Err(BoardError::QuickReceiveNotEligible {
                id: id.clone(),
                reason: "requested quantity is zero",
            });
        }

        let before = Before::capture(item);
        item.quantity_received = item.quantity_requested;
        item.quality_check = Some(QualityCheck::Ok);
        item.status = Status::Received;
        item.status_timestamps.stamp(Status::Received, now_ms);
        let action = format!(
            "Quick Receive: {} {} - Quality OK",
            item.quantity_received, item.unit
        );
        item.push_history(now_ms, action, Some(actor), cap);
        item.touch(now_ms, Some(actor));

        let record = PurchaseRecord::snapshot(item, RecordStatus::Ok, Some(actor), now_ms);
        let receipt = Receipt {
            item: item.clone(),
            record: record.clone(),
        };
        self.records.push(record);
        if let Some(previous) = self.undo.replace(UndoSlot {
            item_id: id.clone(),
            record_id: receipt.record.id.clone(),
            before,
            taken_at: now_ms,
        }) {
            tracing::debug!(item = %previous.item_id, "earlier quick receive can no longer be undone");
        }
        tracing::debug!(item = %id, record = %receipt.record.id, "quick received");
        Ok(receipt)
    }

    /// Item whose quick receive can still be undone at `now_ms`.
    pub fn pending_undo(&self, now_ms: TimestampMs) -> Option<&ItemId> {
        self.undo
            .as_ref()
            .filter(|slot| now_ms - slot.taken_at <= self.settings.undo_window_ms)
            .map(|slot| &slot.item_id)
    }

    /// Reverses the most recent quick receive and removes its record. The slot
    /// is consumed whether or not the undo succeeds.
    pub fn undo_quick_receive(&mut self, now_ms: TimestampMs) -> Result<UndoOutcome, BoardError> {
        let slot = self.undo.take().ok_or(BoardError::NothingToUndo)?;
        if now_ms - slot.taken_at > self.settings.undo_window_ms {
            tracing::debug!(item = %slot.item_id, "undo window expired");
            return Err(BoardError::UndoExpired);
        }
        let index = self.index_of(&slot.item_id)?;
        let item = &mut self.items[index];
        slot.before.restore(item);
        let item = item.clone();
        self.remove_record(&slot.record_id);
        tracing::debug!(item = %item.id, record = %slot.record_id, "quick receive undone");
        Ok(UndoOutcome {
            item,
            removed_record: slot.record_id,
        })
    }

    /// Receives an item whose quality is not OK: the full quantity is assumed
    /// received, the issue is recorded and the item goes straight to `verified`
    /// with an `Issue` record.
    pub fn receive_with_issue(
        &mut self,
        id: &ItemId,
        issue_type: IssueType,
        reason: Option<String>,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<Receipt, BoardError> {
        let index = self.index_of(id)?;
        let cap = self.settings.history_cap;
        let item = &mut self.items[index];
        if !matches!(item.status, Status::Bought | Status::Received) {
            return Err(BoardError::NotReceivable {
                id: id.clone(),
                status: item.status,
            });
        }

        item.quantity_received = item.quantity_requested;
        item.issue = true;
        item.issue_type = Some(issue_type);
        item.issue_reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        item.quality_check = Some(QualityCheck::Issue);
        item.status_timestamps.stamp(Status::Received, now_ms);
        item.status_timestamps.stamp(Status::Verified, now_ms);
        item.status = Status::Verified;
        let action = match &item.issue_reason {
            Some(reason) => format!("Received with issue: {} ({reason})", issue_type.as_str()),
            None => format!("Received with issue: {}", issue_type.as_str()),
        };
        item.push_history(now_ms, action, Some(actor), cap);
        item.touch(now_ms, Some(actor));

        let record = PurchaseRecord::snapshot(item, RecordStatus::Issue, Some(actor), now_ms);
        let receipt = Receipt {
            item: item.clone(),
            record: record.clone(),
        };
        self.records.push(record);
        self.invalidate_undo(id);
        tracing::debug!(item = %id, issue = issue_type.as_str(), "received with issue");
        Ok(receipt)
    }
}
