#![forbid(unsafe_code)]

mod items;
mod receiving;
mod remote;
mod views;

use crate::{Args, Board, ai_error, ai_error_with, ai_ok, now_ms_i64, optional_i64, to_json, ts_ms_to_rfc3339};
use kb_core::{Now, ProcurementItem, TimestampMs};
use serde_json::{Map, Value, json};

type HandlerResult = Result<Value, Value>;

/// Every command the dispatcher accepts, in the order `commands` lists them.
pub(crate) const COMMANDS: &[&str] = &[
    "ping",
    "commands",
    "create_item",
    "edit_item",
    "duplicate_item",
    "get_item",
    "list_items",
    "transition",
    "set_urgency",
    "advance",
    "verify_received",
    "quick_receive",
    "undo_quick_receive",
    "receive_with_issue",
    "delete_item",
    "delete_items",
    "sweep_completed",
    "dashboard",
    "board_counts",
    "issues_summary",
    "report",
    "weekly_review",
    "remote_event",
    "reload",
];

impl Board {
    /// Handles one request object `{cmd, args?, id?}`. Always returns an
    /// envelope; a request `id` is echoed back on it.
    pub(crate) fn handle(&mut self, request: Value) -> Value {
        let Some(obj) = request.as_object() else {
            return ai_error("INVALID_INPUT", "request must be a JSON object");
        };
        let request_id = obj.get("id").cloned();
        let mut resp = match self.dispatch(obj) {
            Ok(resp) | Err(resp) => resp,
        };
        if let (Some(id), Some(out)) = (request_id, resp.as_object_mut()) {
            out.insert("id".to_string(), id);
        }
        resp
    }

    fn dispatch(&mut self, obj: &Map<String, Value>) -> HandlerResult {
        let Some(cmd) = obj.get("cmd").and_then(|v| v.as_str()) else {
            return Err(ai_error("INVALID_INPUT", "cmd is required"));
        };
        let empty = Args::new();
        let args = match obj.get("args") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(args)) => args,
            Some(_) => return Err(ai_error("INVALID_INPUT", "args must be an object")),
        };
        tracing::debug!(cmd, "request");

        match cmd {
            "ping" => Ok(ai_ok(
                "ping",
                json!({ "name": crate::SERVER_NAME, "version": crate::SERVER_VERSION }),
            )),
            "commands" => Ok(ai_ok("commands", json!({ "commands": COMMANDS }))),
            "create_item" => self.create_item(args),
            "edit_item" => self.edit_item(args),
            "duplicate_item" => self.duplicate_item(args),
            "get_item" => self.get_item(args),
            "list_items" => self.list_items(args),
            "transition" => self.transition(args),
            "set_urgency" => self.set_urgency(args),
            "advance" => self.advance(args),
            "verify_received" => self.verify_received(args),
            "quick_receive" => self.quick_receive(args),
            "undo_quick_receive" => self.undo_quick_receive(args),
            "receive_with_issue" => self.receive_with_issue(args),
            "delete_item" => self.delete_item(args),
            "delete_items" => self.delete_items(args),
            "sweep_completed" => self.sweep_completed(args),
            "dashboard" => self.dashboard(args),
            "board_counts" => self.board_counts(args),
            "issues_summary" => self.issues_summary(args),
            "report" => self.report(args),
            "weekly_review" => self.weekly_review(args),
            "remote_event" => self.remote_event(args),
            "reload" => self.reload(),
            other => Err(ai_error_with(
                "UNKNOWN_COMMAND",
                &format!("unknown command: {other}"),
                Some("Send {\"cmd\":\"commands\"} for the supported list."),
                Vec::new(),
            )),
        }
    }

    /// `now_ms` in the args pins the clock for replayed or scripted requests.
    fn now_ms(&self, args: &Args) -> Result<TimestampMs, Value> {
        Ok(optional_i64(args, "now_ms")?.unwrap_or_else(now_ms_i64))
    }

    fn now(&self, args: &Args) -> Result<Now, Value> {
        Ok(Now::with_offset(self.now_ms(args)?, self.offset))
    }
}

fn item_json(item: &ProcurementItem) -> HandlerResult {
    let mut value = to_json(item)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "lastUpdatedAt".to_string(),
            Value::String(ts_ms_to_rfc3339(item.last_updated)),
        );
    }
    Ok(value)
}

fn items_json<'a>(items: impl IntoIterator<Item = &'a ProcurementItem>) -> HandlerResult {
    items
        .into_iter()
        .map(item_json)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
