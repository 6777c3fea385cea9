#![forbid(unsafe_code)]

use crate::debounce::SaveDebouncer;
use crate::error::SyncError;
use crate::event::RemoteEvent;
use crate::persist::Persistence;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::{DEFAULT_ECHO_TTL_MS, DEFAULT_LOCAL_GRACE_MS, DEFAULT_SAVE_DEBOUNCE_MS};
use kb_core::{
    DashboardSnapshot, IssueType, ItemEdit, ItemId, ItemStore, NewItem, Now, ProcurementItem,
    Receipt, StoreSettings, TimeRange, TimestampMs, UndoOutcome, Urgency, compute_dashboard_data,
};
use kb_core::{RecordId, Status};
use kb_storage::{SqliteStore, StoreError};
use std::fmt::Display;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    pub store: StoreSettings,
    pub local_grace_ms: TimestampMs,
    pub echo_ttl_ms: TimestampMs,
    pub save_debounce_ms: TimestampMs,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            local_grace_ms: DEFAULT_LOCAL_GRACE_MS,
            echo_ttl_ms: DEFAULT_ECHO_TTL_MS,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
        }
    }
}

/// One board client: the in-memory store, the backend it writes through to,
/// and the bookkeeping that keeps remote echoes out.
///
/// Local changes are applied first and persisted after. A failed write is
/// logged and counted; the local change stays.
#[derive(Debug)]
pub struct SyncSession<P: Persistence> {
    store: ItemStore,
    persistence: P,
    reconciler: Reconciler,
    debouncer: SaveDebouncer,
    actor: String,
    failed_saves: u64,
}

impl SyncSession<SqliteStore> {
    /// Opens the SQLite board under `storage_dir` and loads it.
    pub fn open_sqlite(
        storage_dir: impl AsRef<Path>,
        settings: SyncSettings,
        actor: impl Into<String>,
    ) -> Result<Self, SyncError> {
        let persistence = SqliteStore::open(storage_dir)?;
        let mut session = Self::new(persistence, settings, actor);
        session.load();
        Ok(session)
    }
}

impl<P: Persistence> SyncSession<P> {
    pub fn new(persistence: P, settings: SyncSettings, actor: impl Into<String>) -> Self {
        Self {
            store: ItemStore::new(settings.store),
            persistence,
            reconciler: Reconciler::new(settings.local_grace_ms, settings.echo_ttl_ms),
            debouncer: SaveDebouncer::new(settings.save_debounce_ms),
            actor: actor.into(),
            failed_saves: 0,
        }
    }

    /// Replaces the local store with whatever the backend holds. A backend
    /// that cannot be read counts as empty.
    pub fn load(&mut self) -> usize {
        let items = self.persistence.load_items().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "items unavailable; starting empty");
            Vec::new()
        });
        let records = self.persistence.load_records().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "purchase history unavailable; starting empty");
            Vec::new()
        });
        let count = items.len();
        self.store.load(items, records);
        count
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Backend writes that failed since the session started.
    pub fn failed_saves(&self) -> u64 {
        self.failed_saves
    }

    pub fn dashboard(&mut self, range: TimeRange, now: Now) -> DashboardSnapshot {
        compute_dashboard_data(self.store.items_mut(), range, now)
    }

    pub fn create_item(
        &mut self,
        input: NewItem,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, SyncError> {
        let item = self.store.create_item(input, &self.actor, now_ms)?;
        self.save(&item, now_ms);
        Ok(item)
    }

    pub fn edit_item(
        &mut self,
        id: &ItemId,
        edit: ItemEdit,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, SyncError> {
        let item = self.store.edit_item(id, edit, &self.actor, now_ms)?;
        self.save(&item, now_ms);
        Ok(item)
    }

    pub fn duplicate_item(
        &mut self,
        id: &ItemId,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, SyncError> {
        let item = self.store.duplicate_item(id, &self.actor, now_ms)?;
        self.save(&item, now_ms);
        Ok(item)
    }

    pub fn transition(
        &mut self,
        id: &ItemId,
        to: Status,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, SyncError> {
        let item = self.store.transition(id, to, &self.actor, now_ms)?;
        self.save_status_move(&item, now_ms);
        Ok(item)
    }

    pub fn set_urgency(
        &mut self,
        ids: &[ItemId],
        urgency: Urgency,
        now_ms: TimestampMs,
    ) -> Result<Vec<ProcurementItem>, SyncError> {
        let changed = self.store.set_urgency(ids, urgency, &self.actor, now_ms)?;
        for item in &changed {
            self.save(item, now_ms);
        }
        Ok(changed)
    }

    pub fn advance(
        &mut self,
        ids: &[ItemId],
        now_ms: TimestampMs,
    ) -> Result<Vec<ProcurementItem>, SyncError> {
        let moved = self.store.advance(ids, &self.actor, now_ms)?;
        for item in &moved {
            self.save_status_move(item, now_ms);
        }
        Ok(moved)
    }

    pub fn verify_received(&mut self, now_ms: TimestampMs) -> Vec<ProcurementItem> {
        let verified = self.store.verify_received(&self.actor, now_ms);
        for item in &verified {
            self.save_status_move(item, now_ms);
        }
        verified
    }

    pub fn quick_receive(&mut self, id: &ItemId, now_ms: TimestampMs) -> Result<Receipt, SyncError> {
        let receipt = self.store.quick_receive(id, &self.actor, now_ms)?;
        self.save(&receipt.item, now_ms);
        if let Err(err) = self.persistence.append_record(&receipt.record) {
            self.write_failed("append_record", &receipt.record.id, err);
        }
        Ok(receipt)
    }

    pub fn undo_quick_receive(&mut self, now_ms: TimestampMs) -> Result<UndoOutcome, SyncError> {
        let outcome = self.store.undo_quick_receive(now_ms)?;
        self.save(&outcome.item, now_ms);
        self.remove_record(&outcome.removed_record);
        Ok(outcome)
    }

    pub fn receive_with_issue(
        &mut self,
        id: &ItemId,
        issue_type: IssueType,
        reason: Option<String>,
        now_ms: TimestampMs,
    ) -> Result<Receipt, SyncError> {
        let receipt = self
            .store
            .receive_with_issue(id, issue_type, reason, &self.actor, now_ms)?;
        self.save(&receipt.item, now_ms);
        if let Err(err) = self.persistence.append_record(&receipt.record) {
            self.write_failed("append_record", &receipt.record.id, err);
        }
        Ok(receipt)
    }

    pub fn delete_item(
        &mut self,
        id: &ItemId,
        now_ms: TimestampMs,
    ) -> Result<ProcurementItem, SyncError> {
        let removed = self.store.delete_item(id)?;
        self.delete_remote(id, now_ms);
        Ok(removed)
    }

    pub fn delete_items(&mut self, ids: &[ItemId], now_ms: TimestampMs) -> Vec<ItemId> {
        let removed = self.store.delete_items(ids);
        for id in &removed {
            self.delete_remote(id, now_ms);
        }
        removed
    }

    pub fn sweep_completed(&mut self, now_ms: TimestampMs, retention_ms: TimestampMs) -> Vec<ItemId> {
        let removed = self.store.sweep_completed(now_ms, retention_ms);
        for id in &removed {
            self.delete_remote(id, now_ms);
        }
        removed
    }

    /// Applies a change observed on the backend. Nothing is written back.
    pub fn apply_remote(&mut self, event: RemoteEvent, now_ms: TimestampMs) -> ReconcileOutcome {
        self.reconciler.apply(&mut self.store, event, now_ms)
    }

    fn save(&mut self, item: &ProcurementItem, now_ms: TimestampMs) {
        self.reconciler.note_local_change(&item.id, now_ms);
        self.reconciler.note_saved(&item.id, now_ms);
        if let Err(err) = self.persistence.save_item(item) {
            self.write_failed("save_item", &item.id, err);
        }
    }

    /// Status moves repeat quickly from drag and drop; identical ones are
    /// written once per debounce window.
    fn save_status_move(&mut self, item: &ProcurementItem, now_ms: TimestampMs) {
        if self.debouncer.should_save(&item.id, item.status, now_ms) {
            self.save(item, now_ms);
        } else {
            self.reconciler.note_local_change(&item.id, now_ms);
            tracing::debug!(item = %item.id, status = %item.status, "status save coalesced");
        }
    }

    fn delete_remote(&mut self, id: &ItemId, now_ms: TimestampMs) {
        self.debouncer.forget(id);
        self.reconciler.note_saved(id, now_ms);
        if let Err(err) = self.persistence.delete_item(id) {
            self.write_failed("delete_item", id, err);
        }
    }

    fn remove_record(&mut self, id: &RecordId) {
        if let Err(err) = self.persistence.remove_record(id) {
            self.write_failed("remove_record", id, err);
        }
    }

    fn write_failed(&mut self, op: &'static str, id: impl Display, err: StoreError) {
        self.failed_saves += 1;
        tracing::warn!(op, id = %id, error = %err, "backend write failed; local change kept");
    }
}
