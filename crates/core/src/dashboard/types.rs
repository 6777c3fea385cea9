#![forbid(unsafe_code)]

use crate::model::{IssueType, ProcurementItem, Status, TimestampMs};
use crate::time_range::TimeRange;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub meta: SnapshotMeta,
    pub counts: DashboardCounts,
    /// Items per board column; every column is present.
    pub column_counts: BTreeMap<Status, usize>,
    pub issues_by_type: BTreeMap<IssueType, usize>,
    pub needs_attention: Vec<AttentionEntry>,
    pub issues_by_supplier: IssuesBySupplier,
    pub urgent_items: Vec<UrgentEntry>,
    pub delayed_items: Vec<ProcurementItem>,
    pub team_workload: Vec<WorkloadEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub time_range: TimeRange,
    pub computed_at: TimestampMs,
    pub total_items: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub pending: usize,
    pub issues: usize,
    pub urgent: usize,
    pub delayed: usize,
    /// Items in `bought` or `received`.
    pub receiving: usize,
}

/// Triage rank; lower surfaces first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Priority {
    UrgentAndDelayed = 1,
    HasIssue = 2,
    Delayed = 3,
    Other = 4,
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value as u8
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionEntry {
    pub item: ProcurementItem,
    pub priority: Priority,
    pub is_urgent: bool,
    pub is_delayed: bool,
    pub has_issue: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEntry {
    pub item: ProcurementItem,
    pub is_delayed: bool,
}

/// Issue counts in the fixed supplier buckets shown on the dashboards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IssuesBySupplier {
    #[serde(rename = "Makro")]
    pub makro: usize,
    #[serde(rename = "FreshMarket")]
    pub fresh_market: usize,
    #[serde(rename = "Bakery")]
    pub bakery: usize,
    #[serde(rename = "Other")]
    pub other: usize,
}

impl IssuesBySupplier {
    pub fn add(&mut self, supplier: &str, count: usize) {
        match supplier {
            "Makro" => self.makro += count,
            "Fresh Market" => self.fresh_market += count,
            "Bakery" => self.bakery += count,
            _ => self.other += count,
        }
    }

    pub fn total(&self) -> usize {
        self.makro + self.fresh_market + self.bakery + self.other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkloadEntry {
    pub person: String,
    pub total: usize,
    pub pending: usize,
    pub issues: usize,
}
