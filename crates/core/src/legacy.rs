#![forbid(unsafe_code)]

//! Rows as they exist across schema versions, and their normalization into
//! the canonical [`ProcurementItem`].

use crate::detect::detect_and_update_issue_status;
use crate::error::BoardError;
use crate::ids::ItemId;
use crate::model::{
    HistoryEntry, IssueType, ProcurementItem, QualityCheck, Status, StatusTimestamps, TimestampMs,
    Urgency,
};
use crate::store::DEFAULT_HISTORY_CAP;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PLACEHOLDER_NAME: &str = "Unknown Item";

/// A stored or remote item row. Every field except `id` may be missing on
/// rows written before the current shape existed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemRow {
    pub id: String,
    #[serde(alias = "item_name")]
    pub name: Option<String>,
    /// Pre-v2 single quantity column.
    pub quantity: Option<f64>,
    #[serde(alias = "requested_qty")]
    pub quantity_requested: Option<f64>,
    #[serde(alias = "received_qty", alias = "actualQuantity")]
    pub quantity_received: Option<f64>,
    pub unit: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub urgency: Option<String>,
    pub issue: Option<bool>,
    #[serde(alias = "issue_type")]
    pub issue_type: Option<String>,
    #[serde(alias = "issue_reason")]
    pub issue_reason: Option<String>,
    #[serde(alias = "quality_check")]
    pub quality_check: Option<String>,
    #[serde(alias = "status_timestamps")]
    pub status_timestamps: Option<BTreeMap<String, TimestampMs>>,
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(alias = "created_by")]
    pub created_by: Option<String>,
    #[serde(alias = "updated_by")]
    pub updated_by: Option<String>,
    #[serde(alias = "updated_at_ms")]
    pub last_updated: Option<TimestampMs>,
}

impl From<&ProcurementItem> for ItemRow {
    fn from(item: &ProcurementItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: Some(item.name.clone()),
            quantity: Some(item.quantity_requested),
            quantity_requested: Some(item.quantity_requested),
            quantity_received: Some(item.quantity_received),
            unit: Some(item.unit.clone()),
            supplier: Some(item.supplier.clone()),
            notes: item.notes.clone(),
            status: Some(item.status.as_str().to_string()),
            urgency: Some(item.urgency.as_str().to_string()),
            issue: Some(item.issue),
            issue_type: item.issue_type.map(|kind| kind.as_str().to_string()),
            issue_reason: item.issue_reason.clone(),
            quality_check: item.quality_check.map(|check| check.as_str().to_string()),
            status_timestamps: Some(
                item.status_timestamps
                    .iter()
                    .map(|(status, at_ms)| (status.as_str().to_string(), at_ms))
                    .collect(),
            ),
            history: Some(item.history.clone()),
            created_by: item.created_by.clone(),
            updated_by: item.updated_by.clone(),
            last_updated: Some(item.last_updated),
        }
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes a row of any schema version.
///
/// `requested` falls back to the legacy `quantity` column, urgency defaults to
/// normal, and the current status plus `need-to-buy` are stamped from
/// `last_updated` when missing. Issue detection runs last. `fallback_now_ms`
/// stands in for rows that never recorded a mutation time.
pub fn normalize_legacy(
    row: ItemRow,
    fallback_now_ms: TimestampMs,
) -> Result<ProcurementItem, BoardError> {
    let id = ItemId::try_new(row.id.clone())
        .map_err(|err| BoardError::Malformed(format!("id `{}`: {err}", row.id)))?;

    let status = match row.status.as_deref() {
        None => Status::NeedToBuy,
        Some(raw) => raw
            .parse::<Status>()
            .map_err(|err| BoardError::Malformed(format!("item {id}: {err}")))?,
    };
    let urgency = row
        .urgency
        .as_deref()
        .and_then(|raw| raw.parse::<Urgency>().ok())
        .unwrap_or_default();
    let issue_type = row
        .issue_type
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| raw.parse().unwrap_or(IssueType::Other));
    let quality_check = row
        .quality_check
        .as_deref()
        .and_then(|raw| raw.parse::<QualityCheck>().ok());

    let last_updated = row.last_updated.unwrap_or(fallback_now_ms);
    let mut status_timestamps = StatusTimestamps::default();
    for (raw, at_ms) in row.status_timestamps.unwrap_or_default() {
        match raw.parse::<Status>() {
            Ok(stamped) => {
                status_timestamps.stamp(stamped, at_ms);
            }
            Err(err) => tracing::debug!(item = %id, error = %err, "dropping status timestamp"),
        }
    }
    status_timestamps.stamp(status, last_updated);
    status_timestamps.stamp(Status::NeedToBuy, last_updated);

    let mut history = row.history.unwrap_or_default();
    if history.len() > DEFAULT_HISTORY_CAP {
        history.drain(..history.len() - DEFAULT_HISTORY_CAP);
    }

    let name = non_blank(row.name).unwrap_or_else(|| PLACEHOLDER_NAME.to_string());
    let quantity_requested = non_negative(row.quantity_requested)
        .or(non_negative(row.quantity))
        .unwrap_or(0.0);

    let mut item = ProcurementItem {
        id,
        name,
        quantity_requested,
        quantity_received: non_negative(row.quantity_received).unwrap_or(0.0),
        unit: row.unit.map(|u| u.trim().to_string()).unwrap_or_default(),
        supplier: row.supplier.map(|s| s.trim().to_string()).unwrap_or_default(),
        notes: non_blank(row.notes),
        status,
        urgency,
        issue: row.issue.unwrap_or(false),
        issue_type,
        issue_reason: non_blank(row.issue_reason),
        quality_check,
        status_timestamps,
        last_updated,
        history,
        created_by: non_blank(row.created_by),
        updated_by: non_blank(row.updated_by),
    };
    detect_and_update_issue_status(&mut item);
    if !item.issue {
        item.issue_reason = None;
    }
    Ok(item)
}
