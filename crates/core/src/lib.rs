#![forbid(unsafe_code)]

//! Domain model of the kitchen procurement board: the item lifecycle, issue
//! and delay detection, selectors, and the dashboard snapshot.

pub mod dashboard;
pub mod detect;
pub mod error;
pub mod ids;
pub mod legacy;
pub mod model;
pub mod report;
pub mod selectors;
pub mod status;
pub mod store;
pub mod time_range;
pub mod validate;

pub use dashboard::{DashboardSnapshot, compute_dashboard_data};
pub use error::BoardError;
pub use ids::{IdError, ItemId, RecordId};
pub use legacy::{ItemRow, normalize_legacy};
pub use model::{
    HistoryEntry, IssueType, ItemEdit, NewItem, ProcurementItem, PurchaseRecord, QualityCheck,
    RecordStatus, Status, StatusTimestamps, TimestampMs, Urgency,
};
pub use store::{ItemStore, Receipt, StoreSettings, UndoOutcome};
pub use time_range::{Now, TimeRange};
