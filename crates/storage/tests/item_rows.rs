#![forbid(unsafe_code)]

use kb_core::{IssueType, ItemStore, NewItem, Status, Urgency};
use kb_storage::{DB_FILE_NAME, SqliteStore, StoreError};
use rusqlite::Connection;

const T0: i64 = 1_768_473_000_000;

fn new_item(name: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        quantity: 4.0,
        unit: "kg".to_string(),
        supplier: "Fresh Market".to_string(),
        urgency: Urgency::Urgent,
        notes: Some("for the weekend menu".to_string()),
    }
}

#[test]
fn open_installs_schema_version() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    assert_eq!(store.schema_version().expect("version").as_deref(), Some("v2"));
    assert!(dir.path().join(DB_FILE_NAME).exists());
    assert!(store.load_all().expect("load").is_empty());
}

#[test]
fn upsert_then_load_preserves_every_field() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut db = SqliteStore::open(dir.path()).expect("open store");

    let mut board = ItemStore::default();
    let created = board.create_item(new_item("Galangal"), "chef", T0).expect("create");
    board
        .transition(&created.id, Status::Ordered, "chef", T0 + 1_000)
        .expect("order");
    board
        .transition(&created.id, Status::Bought, "chef", T0 + 2_000)
        .expect("buy");
    let receipt = board
        .receive_with_issue(&created.id, IssueType::NotFresh, Some("soft".to_string()), "chef", T0 + 3_000)
        .expect("receive");

    db.upsert_item(&receipt.item).expect("upsert");
    let loaded = db.get_item(&created.id).expect("get");
    assert_eq!(loaded, receipt.item);

    let all = db.load_all().expect("load");
    assert_eq!(all, vec![receipt.item]);
}

#[test]
fn upsert_overwrites_and_load_is_newest_first() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut db = SqliteStore::open(dir.path()).expect("open store");
    let mut board = ItemStore::default();

    let older = board.create_item(new_item("Lemongrass"), "chef", T0).expect("create");
    let newer = board.create_item(new_item("Kaffir lime"), "chef", T0 + 10).expect("create");
    db.upsert_item(&newer).expect("upsert newer");
    db.upsert_item(&older).expect("upsert older");

    let names = db
        .load_all()
        .expect("load")
        .into_iter()
        .map(|item| item.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Kaffir lime", "Lemongrass"]);

    let moved = board
        .transition(&older.id, Status::Ordered, "chef", T0 + 20)
        .expect("order");
    db.upsert_item(&moved).expect("upsert moved");
    let first = db.load_all().expect("load").remove(0);
    assert_eq!(first.id, older.id);
    assert_eq!(first.status, Status::Ordered);
}

#[test]
fn delete_reports_whether_a_row_existed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut db = SqliteStore::open(dir.path()).expect("open store");
    let mut board = ItemStore::default();
    let item = board.create_item(new_item("Chilli"), "chef", T0).expect("create");
    db.upsert_item(&item).expect("upsert");

    assert!(db.delete_item(&item.id).expect("delete"));
    assert!(!db.delete_item(&item.id).expect("delete again"));
    assert!(matches!(db.get_item(&item.id), Err(StoreError::UnknownId)));
}

#[test]
fn first_generation_database_is_migrated_on_open() {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("open sqlite db");
    conn.execute_batch(
        "CREATE TABLE purchase_items(id TEXT PRIMARY KEY, item_name TEXT NOT NULL, \
           quantity REAL NOT NULL, unit TEXT NOT NULL, supplier TEXT NOT NULL, status TEXT NOT NULL);\n\
         INSERT INTO purchase_items VALUES ('1736900000000', 'Shallots', 3, 'kg', 'Makro', 'received');\n\
         INSERT INTO purchase_items VALUES ('1736900000001', '', 1, 'kg', 'Makro', 'need-to-buy');\n\
         INSERT INTO purchase_items VALUES ('1736900000002', 'Ghost', 1, 'kg', 'Makro', 'teleported');",
    )
    .expect("seed legacy schema");
    drop(conn);

    let db = SqliteStore::open(dir.path()).expect("open migrated store");
    let items = db.load_all().expect("load");
    assert_eq!(items.len(), 2);

    let shallots = items.iter().find(|item| item.name == "Shallots").expect("shallots");
    assert_eq!(shallots.quantity_requested, 3.0);
    assert_eq!(shallots.quantity_received, 0.0);
    assert!(shallots.issue);
    assert_eq!(shallots.issue_type, Some(IssueType::QUANTITY_MISMATCH));
    assert!(shallots.status_timestamps.get(Status::Received).is_some());

    assert!(items.iter().any(|item| item.name == "Unknown Item"));
}
