#![forbid(unsafe_code)]

use super::HandlerResult;
use crate::{Args, Board, ai_error, ai_ok, to_json};
use kb_sync::{ReconcileOutcome, RemoteEvent};
use serde_json::{Value, json};

impl Board {
    /// Feeds one change-feed event `{eventType, row}` through the reconciler.
    /// Ignored events still succeed; the outcome says why they were dropped.
    pub(super) fn remote_event(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let Some(raw) = args.get("event") else {
            return Err(ai_error("INVALID_INPUT", "event is required"));
        };
        let event = serde_json::from_value::<RemoteEvent>(raw.clone())
            .map_err(|err| ai_error("INVALID_INPUT", &format!("event: {err}")))?;
        let kind = event.kind();
        let outcome = self.session.apply_remote(event, now_ms);
        let applied = matches!(outcome, ReconcileOutcome::Applied);
        Ok(ai_ok(
            "remote_event",
            json!({
                "event": kind,
                "applied": applied,
                "outcome": to_json(&outcome)?,
            }),
        ))
    }

    /// Drops local state and reads the board back from storage.
    pub(super) fn reload(&mut self) -> HandlerResult {
        let items = self.session.load();
        Ok(ai_ok(
            "reload",
            json!({
                "items": items,
                "records": self.session.store().records().len(),
                "failedSaves": Value::from(self.session.failed_saves()),
            }),
        ))
    }
}
