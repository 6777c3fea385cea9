#![forbid(unsafe_code)]

use super::HandlerResult;
use crate::{Args, Board, ai_error, ai_ok, optional_enum, optional_i64, optional_string, optional_usize, to_json};
use kb_core::report::{
    self, MONTHLY_DAYS, REPEATED_ISSUE_MIN, TOP_LIMIT, WEEKLY_DAYS,
};
use kb_core::TimeRange;
use serde_json::json;

impl Board {
    /// The single snapshot every dashboard view reads from.
    pub(super) fn dashboard(&mut self, args: &Args) -> HandlerResult {
        let now = self.now(args)?;
        let range = optional_enum::<TimeRange>(args, "range")?.unwrap_or_default();
        let snapshot = self.session.dashboard(range, now);
        Ok(ai_ok("dashboard", to_json(&snapshot)?))
    }

    /// Column view of the same snapshot `dashboard` returns.
    pub(super) fn board_counts(&mut self, args: &Args) -> HandlerResult {
        let now = self.now(args)?;
        let range = optional_enum::<TimeRange>(args, "range")?.unwrap_or(TimeRange::All);
        let snapshot = self.session.dashboard(range, now);
        Ok(ai_ok(
            "board_counts",
            json!({
                "columns": to_json(&snapshot.column_counts)?,
                "receiving": snapshot.counts.receiving,
                "total": snapshot.meta.total_items,
            }),
        ))
    }

    pub(super) fn issues_summary(&mut self, args: &Args) -> HandlerResult {
        let now = self.now(args)?;
        let range = optional_enum::<TimeRange>(args, "range")?.unwrap_or(TimeRange::All);
        let snapshot = self.session.dashboard(range, now);
        Ok(ai_ok(
            "issues_summary",
            json!({
                "byType": to_json(&snapshot.issues_by_type)?,
                "bySupplier": to_json(&snapshot.issues_by_supplier)?,
                "total": snapshot.counts.issues,
            }),
        ))
    }

    /// Purchase-history report. `kind` picks the view; `days` bounds the
    /// window (defaults to the monthly window).
    pub(super) fn report(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let kind = optional_string(args, "kind")?.unwrap_or_else(|| "frequently_bought".to_string());
        let days = optional_i64(args, "days")?.unwrap_or(MONTHLY_DAYS);
        if days <= 0 {
            return Err(ai_error("INVALID_INPUT", "days must be positive"));
        }
        let limit = optional_usize(args, "limit")?.unwrap_or(TOP_LIMIT);
        let window = report::records_since(self.session.store().records(), now_ms, days);

        let rows = match kind.as_str() {
            "frequently_bought" => report::frequently_bought(window.iter().copied(), limit),
            "high_volume" => report::high_volume(window.iter().copied(), limit),
            "repeated_issues" => {
                let min = optional_usize(args, "min_issues")?.unwrap_or(REPEATED_ISSUE_MIN);
                let mut rows = report::repeated_issues(window.iter().copied(), min);
                rows.truncate(limit);
                rows
            }
            other => {
                return Err(ai_error(
                    "INVALID_INPUT",
                    &format!(
                        "unknown report kind `{other}` (expected frequently_bought, high_volume or repeated_issues)"
                    ),
                ));
            }
        };
        Ok(ai_ok(
            "report",
            json!({
                "kind": kind,
                "days": days,
                "records": window.len(),
                "mostUsedSupplier": to_json(&report::most_used_supplier(window.iter().copied()))?,
                "uniqueItems": report::unique_items(window.iter().copied()),
                "rows": to_json(&rows)?,
            }),
        ))
    }

    pub(super) fn weekly_review(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let review = report::weekly_review(self.session.store().records(), now_ms);
        Ok(ai_ok(
            "weekly_review",
            json!({ "days": WEEKLY_DAYS, "review": to_json(&review)? }),
        ))
    }
}
