#![forbid(unsafe_code)]

//! JSON-in-TEXT columns. Unreadable values are logged and treated as absent
//! so one damaged cell never hides the rest of a row.

use kb_core::{HistoryEntry, StatusTimestamps};
use std::collections::BTreeMap;

pub(in crate::store) fn timestamps_json(stamps: &StatusTimestamps) -> Result<String, serde_json::Error> {
    serde_json::to_string(stamps)
}

pub(in crate::store) fn history_json(history: &[HistoryEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(history)
}

pub(in crate::store) fn parse_timestamps(
    id: &str,
    raw: Option<String>,
) -> Option<BTreeMap<String, i64>> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(map) => Some(map),
        Err(err) => {
            tracing::warn!(item = id, error = %err, "unreadable status_timestamps_json");
            None
        }
    }
}

pub(in crate::store) fn parse_history(id: &str, raw: Option<String>) -> Option<Vec<HistoryEntry>> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(history) => Some(history),
        Err(err) => {
            tracing::warn!(item = id, error = %err, "unreadable history_json");
            None
        }
    }
}
