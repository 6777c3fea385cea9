#![forbid(unsafe_code)]

//! The explicit item collection every board operation goes through.

mod receive;

pub use receive::{Receipt, UndoOutcome};

use crate::detect::{detect_and_update_issue_status, detect_issue_status};
use crate::error::BoardError;
use crate::ids::{ItemId, RecordId};
use crate::model::{ItemEdit, NewItem, ProcurementItem, PurchaseRecord, Status, StatusTimestamps, TimestampMs, Urgency};
use crate::status::{check_transition, next_board_column};
use crate::validate::{choose_name, validate_item_input};
use receive::UndoSlot;

pub const DEFAULT_HISTORY_CAP: usize = 50;
pub const DEFAULT_UNDO_WINDOW_MS: TimestampMs = 5_000;
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

const DAY_MS: TimestampMs = 24 * 60 * 60 * 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    pub history_cap: usize,
    pub undo_window_ms: TimestampMs,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            undo_window_ms: DEFAULT_UNDO_WINDOW_MS,
        }
    }
}

pub fn retention_ms(days: i64) -> TimestampMs {
    days.max(0).saturating_mul(DAY_MS)
}

/// Items are kept newest first. Every mutating method returns a copy of what
/// it changed so callers can persist it without holding a borrow.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<ProcurementItem>,
    records: Vec<PurchaseRecord>,
    undo: Option<UndoSlot>,
    settings: StoreSettings,
}

impl ItemStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    /// Replaces the whole collection, e.g. after a full load.
    pub fn load(&mut self, items: Vec<ProcurementItem>, records: Vec<PurchaseRecord>) {
        self.items = items;
        self.records = records;
        self.undo = None;
        tracing::info!(
            items = self.items.len(),
            records = self.records.len(),
            "item store loaded"
        );
    }

    pub fn items(&self) -> &[ProcurementItem] {
        &self.items
    }

    /// Mutable view for dashboard computation, whose issue detection may flag items.
    pub fn items_mut(&mut self) -> &mut [ProcurementItem] {
        &mut self.items
    }

    pub fn records(&self) -> &[PurchaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&ProcurementItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn index_of(&self, id: &ItemId) -> Result<usize, BoardError> {
        self.items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| BoardError::UnknownItem(id.clone()))
    }

    fn ensure_known(&self, ids: &[ItemId]) -> Result<(), BoardError> {
        for id in ids {
            self.index_of(id)?;
        }
        Ok(())
    }

    /// Drops the quick-receive undo slot when its item changes by any other path.
    fn invalidate_undo(&mut self, id: &ItemId) {
        if self.undo.as_ref().is_some_and(|slot| &slot.item_id == id) {
            tracing::debug!(item = %id, "undo slot discarded");
            self.undo = None;
        }
    }

    pub fn create_item(
        &mut self,
        input: NewItem,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, BoardError> {
        validate_item_input(&input.name, input.quantity, &input.unit, &input.supplier)?;
        let mut item = ProcurementItem {
            id: ItemId::generate(),
            name: input.name.trim().to_string(),
            quantity_requested: input.quantity,
            quantity_received: 0.0,
            unit: input.unit.trim().to_string(),
            supplier: input.supplier.trim().to_string(),
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            status: Status::NeedToBuy,
            urgency: input.urgency,
            issue: false,
            issue_type: None,
            issue_reason: None,
            quality_check: None,
            status_timestamps: StatusTimestamps::started(Status::NeedToBuy, now_ms),
            last_updated: now_ms,
            history: Vec::new(),
            created_by: Some(actor.to_string()),
            updated_by: Some(actor.to_string()),
        };
        item.push_history(now_ms, "Item created", Some(actor), self.settings.history_cap);
        tracing::debug!(item = %item.id, name = %item.name, "item created");
        self.items.insert(0, item.clone());
        Ok(item)
    }

    /// Replaces the editable fields. Status is never touched here.
    pub fn edit_item(
        &mut self,
        id: &ItemId,
        edit: ItemEdit,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, BoardError> {
        validate_item_input(&edit.name, edit.quantity, &edit.unit, &edit.supplier)?;
        let index = self.index_of(id)?;
        let cap = self.settings.history_cap;
        let item = &mut self.items[index];

        let name = choose_name(&item.name, edit.name.trim()).to_string();
        let notes = edit.notes.filter(|n| !n.trim().is_empty());
        let mut actions = Vec::new();
        if name != item.name {
            actions.push(format!("Name changed from \"{}\" to \"{}\"", item.name, name));
        }
        if edit.urgency != item.urgency {
            actions.push(format!("Urgency changed to {}", edit.urgency.as_str()));
        }
        let details_changed = item.quantity_requested != edit.quantity
            || item.unit != edit.unit.trim()
            || item.supplier != edit.supplier.trim()
            || item.notes != notes;
        if details_changed {
            actions.push("Details updated".to_string());
        }
        if actions.is_empty() {
            return Ok(item.clone());
        }

        item.name = name;
        item.quantity_requested = edit.quantity;
        item.unit = edit.unit.trim().to_string();
        item.supplier = edit.supplier.trim().to_string();
        item.urgency = edit.urgency;
        item.notes = notes;
        for action in actions {
            item.push_history(now_ms, action, Some(actor), cap);
        }
        item.touch(now_ms, Some(actor));
        detect_and_update_issue_status(item);
        let updated = item.clone();
        self.invalidate_undo(id);
        tracing::debug!(item = %id, "item edited");
        Ok(updated)
    }

    /// Copies an item back to the start of the flow under a new id.
    pub fn duplicate_item(
        &mut self,
        id: &ItemId,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, BoardError> {
        let source = &self.items[self.index_of(id)?];
        let mut copy = ProcurementItem {
            id: ItemId::generate(),
            name: format!("{} (Copy)", source.name),
            quantity_requested: source.quantity_requested,
            quantity_received: 0.0,
            unit: source.unit.clone(),
            supplier: source.supplier.clone(),
            notes: source.notes.clone(),
            status: Status::NeedToBuy,
            urgency: Urgency::Normal,
            issue: false,
            issue_type: None,
            issue_reason: None,
            quality_check: None,
            status_timestamps: StatusTimestamps::started(Status::NeedToBuy, now_ms),
            last_updated: now_ms,
            history: Vec::new(),
            created_by: Some(actor.to_string()),
            updated_by: Some(actor.to_string()),
        };
        copy.push_history(
            now_ms,
            format!("Item duplicated from \"{}\"", source.name),
            Some(actor),
            self.settings.history_cap,
        );
        tracing::debug!(source = %id, item = %copy.id, "item duplicated");
        self.items.insert(0, copy.clone());
        Ok(copy)
    }

    /// Moves an item along the forward-only flow. Moving to the current
    /// status is accepted and changes nothing.
    pub fn transition(
        &mut self,
        id: &ItemId,
        to: Status,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, BoardError> {
        let index = self.index_of(id)?;
        let cap = self.settings.history_cap;
        let item = &mut self.items[index];
        check_transition(item.status, to)?;
        if item.status == to {
            return Ok(item.clone());
        }
        apply_transition(item, to, actor, now_ms, cap);
        let updated = item.clone();
        self.invalidate_undo(id);
        Ok(updated)
    }

    /// Sets urgency on every listed item. Unknown ids fail the whole call
    /// before anything changes; items already at `urgency` are skipped.
    pub fn set_urgency(
        &mut self,
        ids: &[ItemId],
        urgency: Urgency,
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<Vec<ProcurementItem>, BoardError> {
        self.ensure_known(ids)?;
        let cap = self.settings.history_cap;
        let mut changed = Vec::new();
        for item in self.items.iter_mut().filter(|item| ids.contains(&item.id)) {
            if item.urgency == urgency {
                continue;
            }
            item.urgency = urgency;
            item.push_history(
                now_ms,
                format!("Urgency changed to {}", urgency.as_str()),
                Some(actor),
                cap,
            );
            item.touch(now_ms, Some(actor));
            changed.push(item.clone());
        }
        Ok(changed)
    }

    /// Moves every listed item to the next board column. Items in the last
    /// column or beyond stay where they are.
    pub fn advance(
        &mut self,
        ids: &[ItemId],
        actor: &str,
        now_ms: TimestampMs,
    ) -> Result<Vec<ProcurementItem>, BoardError> {
        self.ensure_known(ids)?;
        let cap = self.settings.history_cap;
        let mut moved = Vec::new();
        for item in self.items.iter_mut().filter(|item| ids.contains(&item.id)) {
            let Some(next) = next_board_column(item.status) else {
                continue;
            };
            apply_transition(item, next, actor, now_ms, cap);
            moved.push(item.clone());
        }
        for item in &moved {
            self.invalidate_undo(&item.id);
        }
        Ok(moved)
    }

    /// Verifies every received item that has no issue.
    pub fn verify_received(&mut self, actor: &str, now_ms: TimestampMs) -> Vec<ProcurementItem> {
        let cap = self.settings.history_cap;
        let mut verified = Vec::new();
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.status == Status::Received && !detect_issue_status(item))
        {
            apply_transition(item, Status::Verified, actor, now_ms, cap);
            verified.push(item.clone());
        }
        for item in &verified {
            self.invalidate_undo(&item.id);
        }
        verified
    }

    pub fn delete_item(&mut self, id: &ItemId) -> Result<ProcurementItem, BoardError> {
        let index = self.index_of(id)?;
        self.invalidate_undo(id);
        tracing::debug!(item = %id, "item deleted");
        Ok(self.items.remove(index))
    }

    /// Removes whichever of `ids` exist and returns them.
    pub fn delete_items(&mut self, ids: &[ItemId]) -> Vec<ItemId> {
        let mut removed = Vec::new();
        self.items.retain(|item| {
            if ids.contains(&item.id) {
                removed.push(item.id.clone());
                false
            } else {
                true
            }
        });
        for id in &removed {
            self.invalidate_undo(id);
        }
        removed
    }

    /// Removes verified, issue-free items untouched for longer than `retention_ms`.
    pub fn sweep_completed(&mut self, now_ms: TimestampMs, retention_ms: TimestampMs) -> Vec<ItemId> {
        let cutoff = now_ms.saturating_sub(retention_ms.max(0));
        let stale = self
            .items
            .iter()
            .filter(|item| {
                item.status == Status::Verified
                    && !detect_issue_status(item)
                    && item.last_updated < cutoff
            })
            .map(|item| item.id.clone())
            .collect::<Vec<_>>();
        let removed = self.delete_items(&stale);
        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), "completed items swept");
        }
        removed
    }

    /// Adds an item that originated elsewhere. Returns `false` if the id is
    /// already present.
    pub fn insert_remote(&mut self, item: ProcurementItem) -> bool {
        if self.get(&item.id).is_some() {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Folds a remote version into the local item: remote fields win, except
    /// that a placeholder name never replaces a real one, local history is
    /// kept, and status timestamps only gain entries.
    pub fn merge_remote(&mut self, incoming: ProcurementItem) -> Option<ProcurementItem> {
        let index = self.index_of(&incoming.id).ok()?;
        let current = &mut self.items[index];
        let name = choose_name(&current.name, &incoming.name).to_string();
        let mut status_timestamps = current.status_timestamps.clone();
        status_timestamps.absorb(&incoming.status_timestamps);
        let history = std::mem::take(&mut current.history);
        let created_by = current.created_by.take().or(incoming.created_by.clone());
        *current = ProcurementItem {
            name,
            status_timestamps,
            history,
            created_by,
            ..incoming
        };
        detect_and_update_issue_status(current);
        let merged = current.clone();
        self.invalidate_undo(&merged.id);
        Some(merged)
    }

    pub fn remove_remote(&mut self, id: &ItemId) -> Option<ProcurementItem> {
        let index = self.index_of(id).ok()?;
        self.invalidate_undo(id);
        Some(self.items.remove(index))
    }

    /// Appends a record unless one with the same id is already present.
    pub fn push_record(&mut self, record: PurchaseRecord) -> bool {
        if self.records.iter().any(|existing| existing.id == record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn remove_record(&mut self, id: &RecordId) -> Option<PurchaseRecord> {
        let index = self.records.iter().position(|record| &record.id == id)?;
        Some(self.records.remove(index))
    }
}

fn apply_transition(
    item: &mut ProcurementItem,
    to: Status,
    actor: &str,
    now_ms: TimestampMs,
    cap: usize,
) {
    let from = item.status;
    item.status = to;
    item.status_timestamps.stamp(to, now_ms);
    item.push_history(
        now_ms,
        format!("Status changed from {from} to {to}"),
        Some(actor),
        cap,
    );
    item.touch(now_ms, Some(actor));
    detect_and_update_issue_status(item);
    tracing::debug!(item = %item.id, %from, %to, "status changed");
}
