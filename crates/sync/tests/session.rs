#![forbid(unsafe_code)]

use crossbeam_channel::unbounded;
use kb_core::{
    IssueType, ItemId, ItemRow, NewItem, ProcurementItem, PurchaseRecord, RecordId, Status,
    Urgency,
};
use kb_storage::{SqliteStore, StoreError};
use kb_sync::{
    IgnoreReason, Persistence, ReconcileOutcome, RemoteEvent, SyncSession, SyncSettings,
    run_reconcile_loop,
};
use std::collections::BTreeMap;

const T0: i64 = 1_768_473_000_000;

/// Backend double that keeps rows in maps and can be told to fail.
#[derive(Debug, Default)]
struct MemoryBackend {
    items: BTreeMap<ItemId, ProcurementItem>,
    records: Vec<PurchaseRecord>,
    saves: usize,
    failing: bool,
}

impl MemoryBackend {
    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::InvalidInput("backend offline"));
        }
        Ok(())
    }
}

impl Persistence for MemoryBackend {
    fn load_items(&mut self) -> Result<Vec<ProcurementItem>, StoreError> {
        self.check()?;
        Ok(self.items.values().cloned().collect())
    }

    fn load_records(&mut self) -> Result<Vec<PurchaseRecord>, StoreError> {
        self.check()?;
        Ok(self.records.clone())
    }

    fn save_item(&mut self, item: &ProcurementItem) -> Result<(), StoreError> {
        self.check()?;
        self.saves += 1;
        self.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn delete_item(&mut self, id: &ItemId) -> Result<(), StoreError> {
        self.check()?;
        self.items.remove(id);
        Ok(())
    }

    fn append_record(&mut self, record: &PurchaseRecord) -> Result<i64, StoreError> {
        self.check()?;
        self.records.push(record.clone());
        Ok(self.records.len() as i64)
    }

    fn remove_record(&mut self, id: &RecordId) -> Result<(), StoreError> {
        self.check()?;
        self.records.retain(|record| &record.id != id);
        Ok(())
    }
}

fn new_item(name: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        quantity: 4.0,
        unit: "kg".to_string(),
        supplier: "Makro".to_string(),
        urgency: Urgency::Normal,
        notes: None,
    }
}

fn memory_session() -> SyncSession<MemoryBackend> {
    SyncSession::new(MemoryBackend::default(), SyncSettings::default(), "kitchen")
}

#[test]
fn local_changes_are_written_through() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Limes"), T0).unwrap();
    session.transition(&item.id, Status::Ordered, T0 + 10).unwrap();

    let stored = &session.persistence().items[&item.id];
    assert_eq!(stored.status, Status::Ordered);
    assert_eq!(stored.created_by.as_deref(), Some("kitchen"));
    assert_eq!(session.failed_saves(), 0);
}

#[test]
fn repeated_status_saves_are_coalesced() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Limes"), T0).unwrap();
    session.transition(&item.id, Status::Ordered, T0 + 10).unwrap();
    let saves = session.persistence().saves;

    session.transition(&item.id, Status::Ordered, T0 + 200).unwrap();
    assert_eq!(session.persistence().saves, saves);

    session.transition(&item.id, Status::Ordered, T0 + 1_100).unwrap();
    assert_eq!(session.persistence().saves, saves + 1);
}

#[test]
fn failed_writes_keep_the_local_change() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Limes"), T0).unwrap();
    session.persistence_mut().failing = true;

    let moved = session.advance(std::slice::from_ref(&item.id), T0 + 10).unwrap();
    assert_eq!(moved[0].status, Status::Ordered);
    assert_eq!(session.store().get(&item.id).unwrap().status, Status::Ordered);
    assert_eq!(session.failed_saves(), 1);
}

#[test]
fn unreadable_backend_loads_as_empty() {
    let mut backend = MemoryBackend::default();
    backend.failing = true;
    let mut session = SyncSession::new(backend, SyncSettings::default(), "kitchen");
    assert_eq!(session.load(), 0);
    assert!(session.store().is_empty());
}

#[test]
fn quick_receive_and_undo_keep_history_in_step() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Shallots"), T0).unwrap();
    session.advance(std::slice::from_ref(&item.id), T0 + 10).unwrap();
    session.advance(std::slice::from_ref(&item.id), T0 + 20).unwrap();

    let receipt = session.quick_receive(&item.id, T0 + 30).unwrap();
    assert_eq!(session.persistence().records.len(), 1);
    assert_eq!(session.persistence().records[0].id, receipt.record.id);

    let undone = session.undo_quick_receive(T0 + 1_000).unwrap();
    assert_eq!(undone.item.status, Status::Bought);
    assert!(session.persistence().records.is_empty());
    assert_eq!(session.persistence().items[&item.id].status, Status::Bought);
}

#[test]
fn issue_receipts_are_recorded() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Chicken thigh"), T0).unwrap();
    session.advance(std::slice::from_ref(&item.id), T0 + 10).unwrap();
    session.advance(std::slice::from_ref(&item.id), T0 + 20).unwrap();

    let receipt = session
        .receive_with_issue(&item.id, IssueType::NotFresh, Some("smells off".into()), T0 + 30)
        .unwrap();
    assert_eq!(receipt.item.status, Status::Verified);
    assert_eq!(session.persistence().records.len(), 1);
    assert!(session.persistence().items[&item.id].issue);
}

#[test]
fn own_writes_echoed_back_are_ignored() {
    let mut session = memory_session();
    let item = session.create_item(new_item("Limes"), T0).unwrap();
    let mut row = ItemRow::from(&item);
    row.urgency = Some("urgent".to_string());

    let outcome = session.apply_remote(RemoteEvent::Update(row.clone()), T0 + 300);
    assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::Echo));

    let outcome = session.apply_remote(RemoteEvent::Update(row), T0 + 5_000);
    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert_eq!(session.store().get(&item.id).unwrap().urgency, Urgency::Urgent);
}

#[test]
fn remote_changes_are_not_written_back() {
    let mut session = memory_session();
    let row = ItemRow {
        id: "remote-item".to_string(),
        name: Some("Galangal".to_string()),
        quantity: Some(1.0),
        unit: Some("kg".to_string()),
        supplier: Some("Market".to_string()),
        status: Some("need-to-buy".to_string()),
        ..ItemRow::default()
    };
    assert_eq!(
        session.apply_remote(RemoteEvent::Insert(row), T0),
        ReconcileOutcome::Applied
    );
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.persistence().saves, 0);
}

#[test]
fn deletes_reach_the_backend() {
    let mut session = memory_session();
    let keep = session.create_item(new_item("Limes"), T0).unwrap();
    let gone = session.create_item(new_item("Basil"), T0 + 1).unwrap();
    let removed = session.delete_items(&[gone.id.clone()], T0 + 2);
    assert_eq!(removed, vec![gone.id.clone()]);
    assert!(session.persistence().items.contains_key(&keep.id));
    assert!(!session.persistence().items.contains_key(&gone.id));

    let outcome = session.apply_remote(RemoteEvent::Delete(gone.id), T0 + 100);
    assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::Echo));
}

#[test]
fn sqlite_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let item_id = {
        let mut session =
            SyncSession::open_sqlite(dir.path(), SyncSettings::default(), "kitchen").unwrap();
        let item = session.create_item(new_item("Jasmine rice"), T0).unwrap();
        session.advance(std::slice::from_ref(&item.id), T0 + 10).unwrap();
        session.advance(std::slice::from_ref(&item.id), T0 + 20).unwrap();
        session.quick_receive(&item.id, T0 + 30).unwrap();
        item.id
    };

    let session =
        SyncSession::<SqliteStore>::open_sqlite(dir.path(), SyncSettings::default(), "kitchen")
            .unwrap();
    let item = session.store().get(&item_id).unwrap();
    assert_eq!(item.status, Status::Received);
    assert_eq!(item.quantity_received, 4.0);
    assert_eq!(session.store().records().len(), 1);
}

#[test]
fn reconcile_loop_drains_the_feed() {
    let mut session = memory_session();
    let local = session.create_item(new_item("Limes"), T0).unwrap();
    let (tx, rx) = unbounded();

    let producer = std::thread::spawn(move || {
        let insert = ItemRow {
            id: "from-tablet".to_string(),
            name: Some("Kaffir lime leaves".to_string()),
            quantity: Some(1.0),
            unit: Some("bag".to_string()),
            supplier: Some("Market".to_string()),
            ..ItemRow::default()
        };
        let placeholder = ItemRow {
            id: "blank".to_string(),
            name: Some(String::new()),
            ..ItemRow::default()
        };
        tx.send(RemoteEvent::Insert(insert)).unwrap();
        tx.send(RemoteEvent::Insert(placeholder)).unwrap();
        tx.send(RemoteEvent::Delete(ItemId::try_new("nowhere").unwrap()))
            .unwrap();
    });

    let mut tick = T0 + 10_000;
    let stats = run_reconcile_loop(&mut session, &rx, || {
        tick += 1;
        tick
    });
    producer.join().unwrap();

    assert_eq!(stats.applied, 1);
    assert_eq!(stats.ignored, 2);
    assert_eq!(session.store().len(), 2);
    assert!(session.store().get(&local.id).is_some());
}
