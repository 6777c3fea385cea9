#![forbid(unsafe_code)]

use crate::ids::{ItemId, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unix epoch milliseconds.
pub type TimestampMs = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NeedToBuy,
    Ordered,
    Bought,
    Received,
    Verified,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::NeedToBuy,
        Status::Ordered,
        Status::Bought,
        Status::Received,
        Status::Verified,
    ];

    /// Board columns, in flow order. `received` and `verified` are reached
    /// through the receiving actions rather than by dragging a card.
    pub const BOARD_COLUMNS: [Status; 3] = [Status::NeedToBuy, Status::Ordered, Status::Bought];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NeedToBuy => "need-to-buy",
            Status::Ordered => "ordered",
            Status::Bought => "bought",
            Status::Received => "received",
            Status::Verified => "verified",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Verified)
    }

    pub fn is_pending(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{raw}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub raw: String,
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                raw: value.to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
        }
    }
}

impl FromStr for Urgency {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "normal" => Ok(Urgency::Normal),
            "urgent" => Ok(Urgency::Urgent),
            other => Err(UnknownVariant {
                kind: "urgency",
                raw: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    WrongWeight,
    NotFresh,
    WrongItem,
    Overpriced,
    Other,
}

impl IssueType {
    /// Assigned when an item is flagged automatically because it arrived short.
    pub const QUANTITY_MISMATCH: IssueType = IssueType::WrongWeight;

    pub const ALL: [IssueType; 5] = [
        IssueType::WrongWeight,
        IssueType::NotFresh,
        IssueType::WrongItem,
        IssueType::Overpriced,
        IssueType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::WrongWeight => "wrong_weight",
            IssueType::NotFresh => "not_fresh",
            IssueType::WrongItem => "wrong_item",
            IssueType::Overpriced => "overpriced",
            IssueType::Other => "other",
        }
    }
}

impl FromStr for IssueType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IssueType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownVariant {
                kind: "issue type",
                raw: value.to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    Ok,
    Issue,
}

impl QualityCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityCheck::Ok => "ok",
            QualityCheck::Issue => "issue",
        }
    }
}

impl FromStr for QualityCheck {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "ok" => Ok(QualityCheck::Ok),
            "issue" => Ok(QualityCheck::Issue),
            other => Err(UnknownVariant {
                kind: "quality check",
                raw: other.to_string(),
            }),
        }
    }
}

/// First-entry instant per status. Entries are never overwritten once present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusTimestamps(BTreeMap<Status, TimestampMs>);

impl StatusTimestamps {
    pub fn started(status: Status, at_ms: TimestampMs) -> Self {
        let mut out = Self::default();
        out.stamp(status, at_ms);
        out
    }

    pub fn get(&self, status: Status) -> Option<TimestampMs> {
        self.0.get(&status).copied()
    }

    /// Records `at_ms` for `status` unless an entry already exists.
    /// Returns whether a new entry was written.
    pub fn stamp(&mut self, status: Status, at_ms: TimestampMs) -> bool {
        if self.0.contains_key(&status) {
            return false;
        }
        self.0.insert(status, at_ms);
        true
    }

    /// Adds every entry of `other` that is missing here.
    pub fn absorb(&mut self, other: &StatusTimestamps) {
        for (status, at_ms) in &other.0 {
            self.stamp(*status, *at_ms);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Status, TimestampMs)> + '_ {
        self.0.iter().map(|(status, at_ms)| (*status, *at_ms))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: TimestampMs,
    pub action: String,
    pub actor: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementItem {
    pub id: ItemId,
    pub name: String,
    pub quantity_requested: f64,
    pub quantity_received: f64,
    pub unit: String,
    pub supplier: String,
    pub notes: Option<String>,
    pub status: Status,
    pub urgency: Urgency,
    pub issue: bool,
    pub issue_type: Option<IssueType>,
    pub issue_reason: Option<String>,
    pub quality_check: Option<QualityCheck>,
    pub status_timestamps: StatusTimestamps,
    pub last_updated: TimestampMs,
    pub history: Vec<HistoryEntry>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl ProcurementItem {
    /// Instant the item entered its current status, falling back to the last
    /// mutation for rows that predate status timestamps.
    pub fn current_status_since(&self) -> TimestampMs {
        self.status_timestamps
            .get(self.status)
            .unwrap_or(self.last_updated)
    }

    /// Instant the item was requested (entered `need-to-buy`).
    pub fn requested_at(&self) -> TimestampMs {
        self.status_timestamps
            .get(Status::NeedToBuy)
            .unwrap_or(self.last_updated)
    }

    /// Appends a history entry, keeping only the newest `cap` entries.
    pub fn push_history(
        &mut self,
        at_ms: TimestampMs,
        action: impl Into<String>,
        actor: Option<&str>,
        cap: usize,
    ) {
        self.history.push(HistoryEntry {
            timestamp: at_ms,
            action: action.into(),
            actor: actor.map(str::to_string),
        });
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    pub(crate) fn touch(&mut self, at_ms: TimestampMs, actor: Option<&str>) {
        self.last_updated = at_ms;
        if let Some(actor) = actor {
            self.updated_by = Some(actor.to_string());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Issue")]
    Issue,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Ok => "OK",
            RecordStatus::Issue => "Issue",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "OK" => Ok(RecordStatus::Ok),
            "Issue" => Ok(RecordStatus::Issue),
            other => Err(UnknownVariant {
                kind: "record status",
                raw: other.to_string(),
            }),
        }
    }
}

/// Immutable receiving snapshot, appended once per terminal receiving outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: RecordId,
    pub item_id: ItemId,
    pub item_name: String,
    pub supplier: String,
    pub quantity: f64,
    pub unit: String,
    pub status: RecordStatus,
    pub issue_type: Option<IssueType>,
    pub issue_reason: Option<String>,
    pub receiver: Option<String>,
    pub recorded_at: TimestampMs,
}

impl PurchaseRecord {
    pub(crate) fn snapshot(
        item: &ProcurementItem,
        status: RecordStatus,
        receiver: Option<&str>,
        at_ms: TimestampMs,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            supplier: item.supplier.clone(),
            quantity: item.quantity_received,
            unit: item.unit.clone(),
            status,
            issue_type: item.issue_type,
            issue_reason: item.issue_reason.clone(),
            receiver: receiver.map(str::to_string),
            recorded_at: at_ms,
        }
    }
}

/// Input for creating an item.
#[derive(Clone, Debug, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub supplier: String,
    pub urgency: Urgency,
    pub notes: Option<String>,
}

/// Full replacement of the editable fields of an item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemEdit {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub supplier: String,
    pub urgency: Urgency,
    pub notes: Option<String>,
}
