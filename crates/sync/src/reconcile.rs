#![forbid(unsafe_code)]

use crate::echo::EchoGuard;
use crate::event::RemoteEvent;
use crate::persist::Persistence;
use crate::session::SyncSession;
use crossbeam_channel::Receiver;
use kb_core::validate::is_placeholder_name;
use kb_core::{ItemId, ItemRow, ItemStore, TimestampMs, normalize_legacy};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Our own write coming back through the feed.
    Echo,
    /// The item changed locally moments ago; the local version wins.
    LocalGrace,
    /// Inserts must carry a real name.
    InvalidName,
    UnknownItem,
    UnknownRecord,
    AlreadyPresent,
    Malformed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum ReconcileOutcome {
    Applied,
    Ignored(IgnoreReason),
}

/// Applies remote changes under last-write-wins with a local preference
/// window. Ignored events are expected traffic, not errors.
#[derive(Debug)]
pub struct Reconciler {
    local_grace_ms: TimestampMs,
    echo: EchoGuard,
    touched: HashMap<ItemId, TimestampMs>,
}

impl Reconciler {
    pub fn new(local_grace_ms: TimestampMs, echo_ttl_ms: TimestampMs) -> Self {
        Self {
            local_grace_ms,
            echo: EchoGuard::new(echo_ttl_ms),
            touched: HashMap::new(),
        }
    }

    /// Records a local modification, saved or not.
    pub fn note_local_change(&mut self, id: &ItemId, now_ms: TimestampMs) {
        self.touched.insert(id.clone(), now_ms);
    }

    /// Records a write sent to the backend.
    pub fn note_saved(&mut self, id: &ItemId, now_ms: TimestampMs) {
        self.echo.note_write(id, now_ms);
    }

    fn in_local_grace(&mut self, id: &ItemId, now_ms: TimestampMs) -> bool {
        let grace = self.local_grace_ms;
        self.touched.retain(|_, at| now_ms - *at < grace);
        self.touched.contains_key(id)
    }

    pub fn apply(
        &mut self,
        store: &mut ItemStore,
        event: RemoteEvent,
        now_ms: TimestampMs,
    ) -> ReconcileOutcome {
        let kind = event.kind();
        let outcome = match event {
            RemoteEvent::Insert(row) => self.apply_insert(store, row, now_ms),
            RemoteEvent::Update(row) => self.apply_update(store, row, now_ms),
            RemoteEvent::Delete(id) => {
                if self.echo.is_echo(&id, now_ms) {
                    ReconcileOutcome::Ignored(IgnoreReason::Echo)
                } else if store.remove_remote(&id).is_some() {
                    ReconcileOutcome::Applied
                } else {
                    ReconcileOutcome::Ignored(IgnoreReason::UnknownItem)
                }
            }
            RemoteEvent::RecordInserted(record) => {
                if store.push_record(record) {
                    ReconcileOutcome::Applied
                } else {
                    ReconcileOutcome::Ignored(IgnoreReason::AlreadyPresent)
                }
            }
            RemoteEvent::RecordDeleted(id) => {
                if store.remove_record(&id).is_some() {
                    ReconcileOutcome::Applied
                } else {
                    ReconcileOutcome::Ignored(IgnoreReason::UnknownRecord)
                }
            }
        };
        match outcome {
            ReconcileOutcome::Applied => tracing::debug!(event = kind, "remote event applied"),
            ReconcileOutcome::Ignored(reason) => {
                tracing::debug!(event = kind, ?reason, "remote event ignored")
            }
        }
        outcome
    }

    fn apply_insert(
        &mut self,
        store: &mut ItemStore,
        row: ItemRow,
        now_ms: TimestampMs,
    ) -> ReconcileOutcome {
        if is_placeholder_name(row.name.as_deref().unwrap_or_default()) {
            return ReconcileOutcome::Ignored(IgnoreReason::InvalidName);
        }
        let item = match normalize_legacy(row, now_ms) {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable remote insert");
                return ReconcileOutcome::Ignored(IgnoreReason::Malformed);
            }
        };
        if self.echo.is_echo(&item.id, now_ms) {
            return ReconcileOutcome::Ignored(IgnoreReason::Echo);
        }
        if store.insert_remote(item) {
            ReconcileOutcome::Applied
        } else {
            ReconcileOutcome::Ignored(IgnoreReason::AlreadyPresent)
        }
    }

    fn apply_update(
        &mut self,
        store: &mut ItemStore,
        row: ItemRow,
        now_ms: TimestampMs,
    ) -> ReconcileOutcome {
        let item = match normalize_legacy(row, now_ms) {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable remote update");
                return ReconcileOutcome::Ignored(IgnoreReason::Malformed);
            }
        };
        if self.echo.is_echo(&item.id, now_ms) {
            return ReconcileOutcome::Ignored(IgnoreReason::Echo);
        }
        if store.get(&item.id).is_none() {
            return ReconcileOutcome::Ignored(IgnoreReason::UnknownItem);
        }
        if self.in_local_grace(&item.id, now_ms) {
            return ReconcileOutcome::Ignored(IgnoreReason::LocalGrace);
        }
        match store.merge_remote(item) {
            Some(_) => ReconcileOutcome::Applied,
            None => ReconcileOutcome::Ignored(IgnoreReason::UnknownItem),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub applied: usize,
    pub ignored: usize,
}

/// Drains `events` on the calling thread until every sender is dropped.
pub fn run_reconcile_loop<P: Persistence>(
    session: &mut SyncSession<P>,
    events: &Receiver<RemoteEvent>,
    mut clock: impl FnMut() -> TimestampMs,
) -> LoopStats {
    let mut stats = LoopStats::default();
    while let Ok(event) = events.recv() {
        match session.apply_remote(event, clock()) {
            ReconcileOutcome::Applied => stats.applied += 1,
            ReconcileOutcome::Ignored(_) => stats.ignored += 1,
        }
    }
    tracing::info!(
        applied = stats.applied,
        ignored = stats.ignored,
        "remote feed closed"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_core::{NewItem, Status, Urgency};

    const T0: i64 = 1_768_473_000_000;

    fn board_with_item() -> (ItemStore, ItemId) {
        let mut store = ItemStore::default();
        let id = store
            .create_item(
                NewItem {
                    name: "Palm sugar".to_string(),
                    quantity: 2.0,
                    unit: "kg".to_string(),
                    supplier: "Makro".to_string(),
                    urgency: Urgency::Normal,
                    notes: None,
                },
                "kitchen",
                T0,
            )
            .unwrap()
            .id;
        (store, id)
    }

    fn remote_row(store: &ItemStore, id: &ItemId) -> ItemRow {
        ItemRow::from(store.get(id).unwrap())
    }

    #[test]
    fn echo_of_own_write_is_ignored() {
        let (mut store, id) = board_with_item();
        let mut reconciler = Reconciler::new(500, 2_000);
        reconciler.note_saved(&id, T0);
        let mut row = remote_row(&store, &id);
        row.status = Some("ordered".to_string());

        let outcome = reconciler.apply(&mut store, RemoteEvent::Update(row.clone()), T0 + 1_000);
        assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::Echo));
        assert_eq!(store.get(&id).unwrap().status, Status::NeedToBuy);

        let outcome = reconciler.apply(&mut store, RemoteEvent::Update(row), T0 + 2_001);
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(store.get(&id).unwrap().status, Status::Ordered);
    }

    #[test]
    fn recent_local_change_wins_for_the_grace_window() {
        let (mut store, id) = board_with_item();
        let mut reconciler = Reconciler::new(500, 2_000);
        reconciler.note_local_change(&id, T0);
        let mut row = remote_row(&store, &id);
        row.urgency = Some("urgent".to_string());

        let outcome = reconciler.apply(&mut store, RemoteEvent::Update(row.clone()), T0 + 499);
        assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::LocalGrace));
        let outcome = reconciler.apply(&mut store, RemoteEvent::Update(row), T0 + 500);
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(store.get(&id).unwrap().urgency, Urgency::Urgent);
    }

    #[test]
    fn inserts_need_a_real_name_and_a_new_id() {
        let (mut store, id) = board_with_item();
        let mut reconciler = Reconciler::new(500, 2_000);
        let placeholder = ItemRow {
            id: "remote-1".to_string(),
            name: Some("Unknown Item".to_string()),
            ..ItemRow::default()
        };
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Insert(placeholder), T0),
            ReconcileOutcome::Ignored(IgnoreReason::InvalidName)
        );

        let duplicate = remote_row(&store, &id);
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Insert(duplicate), T0),
            ReconcileOutcome::Ignored(IgnoreReason::AlreadyPresent)
        );

        let fresh = ItemRow {
            id: "remote-2".to_string(),
            name: Some("Fish sauce".to_string()),
            quantity: Some(6.0),
            unit: Some("bottle".to_string()),
            supplier: Some("Makro".to_string()),
            ..ItemRow::default()
        };
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Insert(fresh), T0),
            ReconcileOutcome::Applied
        );
        assert_eq!(store.items()[0].name, "Fish sauce");
    }

    #[test]
    fn updates_and_deletes_for_unknown_items_are_dropped() {
        let (mut store, _) = board_with_item();
        let mut reconciler = Reconciler::new(500, 2_000);
        let stranger = ItemRow {
            id: "elsewhere".to_string(),
            name: Some("Tamarind".to_string()),
            ..ItemRow::default()
        };
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Update(stranger), T0),
            ReconcileOutcome::Ignored(IgnoreReason::UnknownItem)
        );
        let gone = ItemId::try_new("elsewhere").unwrap();
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Delete(gone), T0),
            ReconcileOutcome::Ignored(IgnoreReason::UnknownItem)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn malformed_rows_are_ignored() {
        let (mut store, id) = board_with_item();
        let mut reconciler = Reconciler::new(500, 2_000);
        let mut row = remote_row(&store, &id);
        row.status = Some("misplaced".to_string());
        assert_eq!(
            reconciler.apply(&mut store, RemoteEvent::Update(row), T0 + 10_000),
            ReconcileOutcome::Ignored(IgnoreReason::Malformed)
        );
    }
}
