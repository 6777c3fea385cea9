#![forbid(unsafe_code)]

use super::{HandlerResult, item_json};
use crate::{
    Args, Board, ai_ok_with_warnings, ai_ok, optional_enum, optional_string, require_id, sync_error,
    to_json, ts_ms_to_rfc3339, warning,
};
use kb_core::IssueType;
use serde_json::json;

impl Board {
    pub(super) fn quick_receive(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let receipt = self.session.quick_receive(&id, now_ms).map_err(sync_error)?;
        let undo_until = now_ms + self.session.store().settings().undo_window_ms;
        Ok(ai_ok(
            "quick_receive",
            json!({
                "item": item_json(&receipt.item)?,
                "record": to_json(&receipt.record)?,
                "undoUntil": undo_until,
                "undoUntilAt": ts_ms_to_rfc3339(undo_until),
            }),
        ))
    }

    pub(super) fn undo_quick_receive(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let outcome = self.session.undo_quick_receive(now_ms).map_err(sync_error)?;
        Ok(ai_ok(
            "undo_quick_receive",
            json!({
                "item": item_json(&outcome.item)?,
                "removedRecord": outcome.removed_record,
            }),
        ))
    }

    /// Full receiving path for goods that are not OK. Without an explicit
    /// `issue_type` the issue is recorded as a quantity mismatch.
    pub(super) fn receive_with_issue(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let explicit = optional_enum::<IssueType>(args, "issue_type")?;
        let issue_type = explicit.unwrap_or(IssueType::QUANTITY_MISMATCH);
        let reason = optional_string(args, "reason")?;
        let receipt = self
            .session
            .receive_with_issue(&id, issue_type, reason, now_ms)
            .map_err(sync_error)?;

        let mut warnings = Vec::new();
        if explicit.is_none() {
            warnings.push(warning(
                "ISSUE_TYPE_DEFAULTED",
                "issue_type was not given; recorded as wrong_weight",
                "Pass issue_type to record the actual problem.",
            ));
        }
        Ok(ai_ok_with_warnings(
            "receive_with_issue",
            json!({
                "item": item_json(&receipt.item)?,
                "record": to_json(&receipt.record)?,
            }),
            warnings,
            Vec::new(),
        ))
    }
}
