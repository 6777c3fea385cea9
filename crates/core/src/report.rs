#![forbid(unsafe_code)]

//! Reporting over the append-only purchase history.

use crate::model::{PurchaseRecord, RecordStatus, TimestampMs};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const DAY_MS: TimestampMs = 24 * 60 * 60 * 1000;

pub const WEEKLY_DAYS: i64 = 7;
pub const MONTHLY_DAYS: i64 = 30;
pub const TOP_LIMIT: usize = 10;
pub const REPEATED_ISSUE_MIN: usize = 2;

/// Per (item name, supplier) aggregate.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTally {
    pub name: String,
    pub supplier: String,
    pub unit: String,
    pub count: usize,
    pub total_quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SupplierUsage {
    pub supplier: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReview {
    pub since: TimestampMs,
    pub total_records: usize,
    pub ok_count: usize,
    pub issue_count: usize,
    pub unique_items: usize,
    pub most_used_supplier: Option<SupplierUsage>,
    pub frequently_bought: Vec<ItemTally>,
    pub high_volume: Vec<ItemTally>,
    pub repeated_issues: Vec<ItemTally>,
}

pub fn records_since(
    records: &[PurchaseRecord],
    now_ms: TimestampMs,
    days: i64,
) -> Vec<&PurchaseRecord> {
    let since = now_ms.saturating_sub(days.max(0).saturating_mul(DAY_MS));
    records
        .iter()
        .filter(|record| record.recorded_at >= since)
        .collect()
}

fn tally<'a>(records: impl IntoIterator<Item = &'a PurchaseRecord>) -> Vec<ItemTally> {
    let mut by_key: BTreeMap<(&str, &str), ItemTally> = BTreeMap::new();
    for record in records {
        let entry = by_key
            .entry((record.item_name.as_str(), record.supplier.as_str()))
            .or_insert_with(|| ItemTally {
                name: record.item_name.clone(),
                supplier: record.supplier.clone(),
                unit: record.unit.clone(),
                count: 0,
                total_quantity: 0.0,
            });
        entry.count += 1;
        entry.total_quantity += record.quantity;
    }
    by_key.into_values().collect()
}

/// Most purchased items by number of receipts.
pub fn frequently_bought<'a>(
    records: impl IntoIterator<Item = &'a PurchaseRecord>,
    limit: usize,
) -> Vec<ItemTally> {
    let mut tallies = tally(records);
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies.truncate(limit);
    tallies
}

/// Items with the largest total received quantity.
pub fn high_volume<'a>(
    records: impl IntoIterator<Item = &'a PurchaseRecord>,
    limit: usize,
) -> Vec<ItemTally> {
    let mut tallies = tally(records);
    tallies.sort_by(|a, b| {
        b.total_quantity
            .partial_cmp(&a.total_quantity)
            .unwrap_or(Ordering::Equal)
    });
    tallies.truncate(limit);
    tallies
}

/// Items received with an issue at least `min_issues` times.
pub fn repeated_issues<'a>(
    records: impl IntoIterator<Item = &'a PurchaseRecord>,
    min_issues: usize,
) -> Vec<ItemTally> {
    let issues = records
        .into_iter()
        .filter(|record| record.status == RecordStatus::Issue);
    let mut tallies = tally(issues)
        .into_iter()
        .filter(|t| t.count >= min_issues)
        .collect::<Vec<_>>();
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
}

/// Ties go to the alphabetically first supplier.
pub fn most_used_supplier<'a>(
    records: impl IntoIterator<Item = &'a PurchaseRecord>,
) -> Option<SupplierUsage> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.supplier.as_str()).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (supplier, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((supplier, count));
        }
    }
    best.map(|(supplier, count)| SupplierUsage {
        supplier: supplier.to_string(),
        count,
    })
}

/// Distinct item names, compared case-insensitively.
pub fn unique_items<'a>(records: impl IntoIterator<Item = &'a PurchaseRecord>) -> usize {
    let mut names = records
        .into_iter()
        .map(|record| record.item_name.trim().to_lowercase())
        .collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names.len()
}

pub fn weekly_review(records: &[PurchaseRecord], now_ms: TimestampMs) -> WeeklyReview {
    let window = records_since(records, now_ms, WEEKLY_DAYS);
    let issue_count = window
        .iter()
        .filter(|record| record.status == RecordStatus::Issue)
        .count();
    WeeklyReview {
        since: now_ms.saturating_sub(WEEKLY_DAYS * DAY_MS),
        total_records: window.len(),
        ok_count: window.len() - issue_count,
        issue_count,
        unique_items: unique_items(window.iter().copied()),
        most_used_supplier: most_used_supplier(window.iter().copied()),
        frequently_bought: frequently_bought(window.iter().copied(), TOP_LIMIT),
        high_volume: high_volume(window.iter().copied(), TOP_LIMIT),
        repeated_issues: repeated_issues(window.iter().copied(), REPEATED_ISSUE_MIN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ItemId, RecordId};
    use crate::model::IssueType;

    fn record(name: &str, supplier: &str, qty: f64, status: RecordStatus, at: i64) -> PurchaseRecord {
        PurchaseRecord {
            id: RecordId::generate(),
            item_id: ItemId::generate(),
            item_name: name.to_string(),
            supplier: supplier.to_string(),
            quantity: qty,
            unit: "kg".to_string(),
            status,
            issue_type: (status == RecordStatus::Issue).then_some(IssueType::NotFresh),
            issue_reason: None,
            receiver: Some("kitchen".to_string()),
            recorded_at: at,
        }
    }

    fn sample(now: i64) -> Vec<PurchaseRecord> {
        vec![
            record("Eggs", "Makro", 30.0, RecordStatus::Ok, now - DAY_MS),
            record("Eggs", "Makro", 30.0, RecordStatus::Issue, now - 2 * DAY_MS),
            record("Eggs", "Makro", 30.0, RecordStatus::Issue, now - 3 * DAY_MS),
            record("Bread", "Bakery", 5.0, RecordStatus::Ok, now - DAY_MS),
            record("Basil", "Fresh Market", 1.0, RecordStatus::Ok, now - 2 * DAY_MS),
            record("Basil", "Fresh Market", 100.0, RecordStatus::Ok, now - 20 * DAY_MS),
        ]
    }

    #[test]
    fn window_filters_by_record_time() {
        let now = 100 * DAY_MS;
        let records = sample(now);
        assert_eq!(records_since(&records, now, WEEKLY_DAYS).len(), 5);
        assert_eq!(records_since(&records, now, MONTHLY_DAYS).len(), 6);
    }

    #[test]
    fn oversized_window_keeps_everything() {
        let now = 100 * DAY_MS;
        let records = sample(now);
        assert_eq!(records_since(&records, now, i64::MAX / 1000).len(), 6);
        assert_eq!(records_since(&records, now, i64::MAX).len(), 6);
        assert!(records_since(&records, now, -5).is_empty());
    }

    #[test]
    fn rankings_are_descending() {
        let now = 100 * DAY_MS;
        let records = sample(now);
        let frequent = frequently_bought(&records, 2);
        assert_eq!(frequent.len(), 2);
        assert_eq!(frequent[0].name, "Eggs");
        assert_eq!(frequent[0].count, 3);

        let volume = high_volume(&records, 1);
        assert_eq!(volume[0].name, "Basil");
        assert_eq!(volume[0].total_quantity, 101.0);

        let repeated = repeated_issues(&records, REPEATED_ISSUE_MIN);
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].count, 2);
    }

    #[test]
    fn supplier_and_unique_counts() {
        let now = 100 * DAY_MS;
        let records = sample(now);
        let top = most_used_supplier(&records).unwrap();
        assert_eq!(top.supplier, "Makro");
        assert_eq!(top.count, 3);
        assert_eq!(unique_items(&records), 3);
        assert!(most_used_supplier(&Vec::<PurchaseRecord>::new()).is_none());
    }

    #[test]
    fn weekly_review_only_sees_the_last_week() {
        let now = 100 * DAY_MS;
        let review = weekly_review(&sample(now), now);
        assert_eq!(review.total_records, 5);
        assert_eq!(review.issue_count, 2);
        assert_eq!(review.ok_count, 3);
        assert_eq!(review.high_volume[0].name, "Eggs");
        assert_eq!(review.since, now - 7 * DAY_MS);
    }
}
