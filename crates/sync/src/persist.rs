#![forbid(unsafe_code)]

use kb_core::{ItemId, ProcurementItem, PurchaseRecord, RecordId};
use kb_storage::{SqliteStore, StoreError};

/// What the session needs from the backend it saves to.
pub trait Persistence {
    fn load_items(&mut self) -> Result<Vec<ProcurementItem>, StoreError>;
    fn load_records(&mut self) -> Result<Vec<PurchaseRecord>, StoreError>;
    fn save_item(&mut self, item: &ProcurementItem) -> Result<(), StoreError>;
    fn delete_item(&mut self, id: &ItemId) -> Result<(), StoreError>;
    fn append_record(&mut self, record: &PurchaseRecord) -> Result<i64, StoreError>;
    fn remove_record(&mut self, id: &RecordId) -> Result<(), StoreError>;
}

impl Persistence for SqliteStore {
    fn load_items(&mut self) -> Result<Vec<ProcurementItem>, StoreError> {
        self.load_all()
    }

    fn load_records(&mut self) -> Result<Vec<PurchaseRecord>, StoreError> {
        self.list_purchase_records()
    }

    fn save_item(&mut self, item: &ProcurementItem) -> Result<(), StoreError> {
        self.upsert_item(item)
    }

    fn delete_item(&mut self, id: &ItemId) -> Result<(), StoreError> {
        SqliteStore::delete_item(self, id).map(|_| ())
    }

    fn append_record(&mut self, record: &PurchaseRecord) -> Result<i64, StoreError> {
        self.append_purchase_record(record)
    }

    fn remove_record(&mut self, id: &RecordId) -> Result<(), StoreError> {
        self.remove_purchase_record(id).map(|_| ())
    }
}
