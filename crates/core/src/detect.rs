#![forbid(unsafe_code)]

use crate::model::{IssueType, ProcurementItem, Status, TimestampMs, Urgency};
use crate::status::delay_threshold_ms;

/// An item has an issue when it is flagged, arrived short, or carries an issue type.
pub fn detect_issue_status(item: &ProcurementItem) -> bool {
    if item.issue {
        return true;
    }
    if item.status == Status::Received && item.quantity_received < item.quantity_requested {
        return true;
    }
    item.issue_type.is_some()
}

/// Sets the issue flag when detection fires. Never clears it.
/// Returns whether the item changed.
pub fn detect_and_update_issue_status(item: &mut ProcurementItem) -> bool {
    if item.issue || !detect_issue_status(item) {
        return false;
    }
    item.issue = true;
    if item.issue_type.is_none() {
        item.issue_type = Some(IssueType::QUANTITY_MISMATCH);
    }
    tracing::debug!(item = %item.id, "issue detected");
    true
}

pub fn is_item_delayed(item: &ProcurementItem, now_ms: TimestampMs) -> bool {
    let Some(threshold) = delay_threshold_ms(item.status) else {
        return false;
    };
    now_ms.saturating_sub(item.current_status_since()) > threshold
}

pub fn is_item_urgent(item: &ProcurementItem) -> bool {
    item.urgency == Urgency::Urgent && item.status != Status::Verified
}
