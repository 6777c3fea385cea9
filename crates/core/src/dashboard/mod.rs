#![forbid(unsafe_code)]

//! The single dashboard computation every view reads from. Views render
//! exclusively from one [`DashboardSnapshot`] per pass; none of them derive
//! counts on their own.

mod types;

pub use types::*;

use crate::detect::{detect_and_update_issue_status, detect_issue_status, is_item_delayed, is_item_urgent};
use crate::model::ProcurementItem;
use crate::selectors;
use crate::time_range::{Now, TimeRange};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkloadStats {
    pub total: usize,
    pub pending: usize,
    pub issues: usize,
}

/// Per-person workload. Assignment was removed from the board, so nothing
/// attributes items to people and the mapping is always empty.
pub fn team_workload<'a>(
    _items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> BTreeMap<String, WorkloadStats> {
    BTreeMap::new()
}

pub fn priority_for(is_urgent: bool, is_delayed: bool, has_issue: bool) -> Priority {
    if is_urgent && is_delayed {
        Priority::UrgentAndDelayed
    } else if has_issue {
        Priority::HasIssue
    } else if is_delayed {
        Priority::Delayed
    } else {
        Priority::Other
    }
}

/// Computes the dashboard snapshot for `range` at `now`.
///
/// Issue detection is rerun on every item inside the range, so the items
/// passed in may gain `issue`/`issue_type`; that is the only mutation.
pub fn compute_dashboard_data(
    items: &mut [ProcurementItem],
    range: TimeRange,
    now: Now,
) -> DashboardSnapshot {
    for item in items.iter_mut().filter(|item| range.contains(item, now)) {
        detect_and_update_issue_status(item);
    }

    let filtered = selectors::filter_by_time_range(items.iter(), range, now);

    let counts = DashboardCounts {
        pending: selectors::pending(filtered.iter().copied()).len(),
        issues: selectors::issues(filtered.iter().copied()).len(),
        urgent: selectors::urgent(filtered.iter().copied()).len(),
        delayed: selectors::delayed(filtered.iter().copied(), now.ms).len(),
        receiving: selectors::receiving(filtered.iter().copied()).len(),
    };
    let column_counts = selectors::count_by_status(filtered.iter().copied());
    let issues_by_type = selectors::count_issues_by_type(filtered.iter().copied());

    let mut needs_attention = filtered
        .iter()
        .filter(|item| item.status.is_pending())
        .filter_map(|item| {
            let is_urgent = is_item_urgent(item);
            let is_delayed = is_item_delayed(item, now.ms);
            let has_issue = detect_issue_status(item);
            if !(is_urgent || is_delayed || has_issue) {
                return None;
            }
            Some(AttentionEntry {
                item: (*item).clone(),
                priority: priority_for(is_urgent, is_delayed, has_issue),
                is_urgent,
                is_delayed,
                has_issue,
            })
        })
        .collect::<Vec<_>>();
    needs_attention.sort_by_key(|entry| (entry.priority, entry.item.current_status_since()));

    let mut issues_by_supplier = IssuesBySupplier::default();
    for (supplier, group) in selectors::group_issues_by_supplier(filtered.iter().copied()) {
        issues_by_supplier.add(&supplier, group.len());
    }

    let urgent_items = selectors::urgent(filtered.iter().copied())
        .into_iter()
        .map(|item| UrgentEntry {
            item: item.clone(),
            is_delayed: is_item_delayed(item, now.ms),
        })
        .collect();

    let mut delayed_items = selectors::delayed(filtered.iter().copied(), now.ms)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    delayed_items.sort_by_key(ProcurementItem::current_status_since);

    let mut team = team_workload(filtered.iter().copied())
        .into_iter()
        .map(|(person, stats)| WorkloadEntry {
            person,
            total: stats.total,
            pending: stats.pending,
            issues: stats.issues,
        })
        .collect::<Vec<_>>();
    team.sort_by(|a, b| b.total.cmp(&a.total));

    tracing::debug!(
        range = range.as_str(),
        total = filtered.len(),
        attention = needs_attention.len(),
        "dashboard computed"
    );

    DashboardSnapshot {
        meta: SnapshotMeta {
            time_range: range,
            computed_at: now.ms,
            total_items: filtered.len(),
        },
        counts,
        column_counts,
        issues_by_type,
        needs_attention,
        issues_by_supplier,
        urgent_items,
        delayed_items,
        team_workload: team,
    }
}

#[cfg(test)]
mod tests;
