#![forbid(unsafe_code)]

//! Pure views over an item collection. Every selector accepts anything that
//! yields `&ProcurementItem` (a slice, or the output of another selector) and
//! returns a new vector; inputs are never mutated.

use crate::detect::{detect_issue_status, is_item_delayed, is_item_urgent};
use crate::model::{IssueType, ProcurementItem, Status, TimestampMs};
use crate::time_range::{Now, TimeRange};
use std::collections::BTreeMap;

pub type Grouped<'a, K> = BTreeMap<K, Vec<&'a ProcurementItem>>;

pub fn filter_by_search<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
    term: &str,
) -> Vec<&'a ProcurementItem> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.into_iter().collect();
    }
    items
        .into_iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.supplier.to_lowercase().contains(&needle)
                || item
                    .notes
                    .as_deref()
                    .is_some_and(|notes| notes.to_lowercase().contains(&needle))
        })
        .collect()
}

/// `None` keeps every supplier.
pub fn filter_by_supplier<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
    supplier: Option<&str>,
) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| supplier.is_none_or(|s| item.supplier == s))
        .collect()
}

/// `None` keeps every status.
pub fn filter_by_status<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
    status: Option<Status>,
) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| status.is_none_or(|s| item.status == s))
        .collect()
}

pub fn filter_by_time_range<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
    range: TimeRange,
    now: Now,
) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| range.contains(item, now))
        .collect()
}

pub fn pending<'a>(items: impl IntoIterator<Item = &'a ProcurementItem>) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| item.status.is_pending())
        .collect()
}

pub fn issues<'a>(items: impl IntoIterator<Item = &'a ProcurementItem>) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| detect_issue_status(item))
        .collect()
}

pub fn urgent<'a>(items: impl IntoIterator<Item = &'a ProcurementItem>) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| is_item_urgent(item))
        .collect()
}

pub fn delayed<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
    now_ms: TimestampMs,
) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| is_item_delayed(item, now_ms))
        .collect()
}

/// Items waiting at the receiving desk.
pub fn receiving<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> Vec<&'a ProcurementItem> {
    items
        .into_iter()
        .filter(|item| matches!(item.status, Status::Bought | Status::Received))
        .collect()
}

pub fn group_by_supplier<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> Grouped<'a, String> {
    let mut grouped = Grouped::new();
    for item in items {
        let key = if item.supplier.trim().is_empty() {
            "Unknown".to_string()
        } else {
            item.supplier.clone()
        };
        grouped.entry(key).or_default().push(item);
    }
    grouped
}

pub fn group_by_status<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> Grouped<'a, Status> {
    let mut grouped = Grouped::new();
    for item in items {
        grouped.entry(item.status).or_default().push(item);
    }
    grouped
}

/// Groups items that have an issue; an issue without a type lands under `other`.
pub fn group_by_issue_type<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> Grouped<'a, IssueType> {
    let mut grouped = Grouped::new();
    for item in issues(items) {
        let key = item.issue_type.unwrap_or(IssueType::Other);
        grouped.entry(key).or_default().push(item);
    }
    grouped
}

pub fn group_issues_by_supplier<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> Grouped<'a, String> {
    group_by_supplier(issues(items))
}

/// Counts per board column; every column is present even when empty.
pub fn count_by_status<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> BTreeMap<Status, usize> {
    let mut counts: BTreeMap<Status, usize> =
        Status::BOARD_COLUMNS.iter().map(|s| (*s, 0)).collect();
    for item in items {
        if let Some(count) = counts.get_mut(&item.status) {
            *count += 1;
        }
    }
    counts
}

pub fn count_issues_by_type<'a>(
    items: impl IntoIterator<Item = &'a ProcurementItem>,
) -> BTreeMap<IssueType, usize> {
    group_by_issue_type(items)
        .into_iter()
        .map(|(kind, group)| (kind, group.len()))
        .collect()
}
