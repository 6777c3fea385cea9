#![forbid(unsafe_code)]

use kb_core::BoardError;
use kb_storage::StoreError;
use kb_sync::SyncError;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) fn warning(code: &str, message: &str, recovery: &str) -> Value {
    json!({
        "code": code,
        "message": message,
        "recovery": recovery
    })
}

pub(crate) fn ai_ok_with_warnings(
    intent: &str,
    result: Value,
    warnings: Vec<Value>,
    refs: Vec<Value>,
) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "warnings": warnings,
        "refs": refs,
        "error": null
    })
}

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    ai_ok_with_warnings(intent, result, Vec::new(), Vec::new())
}

pub(crate) fn ai_error_with(
    code: &str,
    message: &str,
    recovery: Option<&str>,
    refs: Vec<Value>,
) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "warnings": [],
        "refs": refs,
        "error": Value::Object(error_obj)
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None, Vec::new())
}

fn board_recovery(err: &BoardError) -> Option<&'static str> {
    match err {
        BoardError::InvalidTransition { .. } => {
            Some("Move the item one step at a time along need-to-buy > ordered > bought > received > verified.")
        }
        BoardError::Validation(_) => Some("Fix the listed fields and resend."),
        BoardError::UnknownItem(_) => Some("Reload the board with list_items to get current ids."),
        BoardError::QuickReceiveNotEligible { .. } | BoardError::NotReceivable { .. } => {
            Some("Use receive_with_issue, or move the item to bought first.")
        }
        BoardError::UndoExpired => Some("Undo is only available for a few seconds after a quick receive."),
        BoardError::NothingToUndo | BoardError::Malformed(_) => None,
    }
}

pub(crate) fn board_error(err: &BoardError) -> Value {
    let refs = match err {
        BoardError::Validation(messages) => messages.iter().map(|m| json!(m)).collect(),
        BoardError::UnknownItem(id) => vec![json!(id)],
        _ => Vec::new(),
    };
    ai_error_with(err.code(), &err.to_string(), board_recovery(err), refs)
}

pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Io(e) => format!("IO: {e}"),
        StoreError::Sql(e) => format!("SQL: {e}"),
        StoreError::Json(e) => format!("JSON: {e}"),
        StoreError::InvalidInput(msg) => format!("Invalid input: {msg}"),
        StoreError::UnknownId => "Unknown id".to_string(),
        StoreError::CorruptRow { id, message } => format!("Corrupt row {id}: {message}"),
    }
}

pub(crate) fn sync_error(err: SyncError) -> Value {
    match err {
        SyncError::Board(err) => board_error(&err),
        SyncError::Store(err) => ai_error_with(
            "STORE_ERROR",
            &format_store_error(&err),
            Some("Check the storage directory and restart the board."),
            Vec::new(),
        ),
    }
}

/// Serializes a result payload; failure here is a bug, reported as such.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, Value> {
    serde_json::to_value(value)
        .map_err(|err| ai_error("INTERNAL", &format!("cannot serialize result: {err}")))
}
