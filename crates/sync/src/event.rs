#![forbid(unsafe_code)]

use kb_core::{ItemId, ItemRow, PurchaseRecord, RecordId};
use serde::Deserialize;

/// A change made elsewhere, as delivered by the backend's change feed.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "eventType", content = "row")]
pub enum RemoteEvent {
    #[serde(rename = "INSERT")]
    Insert(ItemRow),
    #[serde(rename = "UPDATE")]
    Update(ItemRow),
    #[serde(rename = "DELETE")]
    Delete(ItemId),
    #[serde(rename = "RECORD_INSERTED")]
    RecordInserted(PurchaseRecord),
    #[serde(rename = "RECORD_DELETED")]
    RecordDeleted(RecordId),
}

impl RemoteEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteEvent::Insert(_) => "insert",
            RemoteEvent::Update(_) => "update",
            RemoteEvent::Delete(_) => "delete",
            RemoteEvent::RecordInserted(_) => "record_inserted",
            RemoteEvent::RecordDeleted(_) => "record_deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_change_feed_shapes() {
        let event: RemoteEvent = serde_json::from_str(
            r#"{"eventType":"UPDATE","row":{"id":"x1","item_name":"Milk","status":"ordered"}}"#,
        )
        .unwrap();
        let RemoteEvent::Update(row) = &event else {
            panic!("expected update, got {event:?}");
        };
        assert_eq!(row.name.as_deref(), Some("Milk"));
        assert_eq!(event.kind(), "update");

        let event: RemoteEvent =
            serde_json::from_str(r#"{"eventType":"DELETE","row":"x1"}"#).unwrap();
        assert_eq!(event, RemoteEvent::Delete(ItemId::try_new("x1").unwrap()));
    }
}
