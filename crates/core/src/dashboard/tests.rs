#![forbid(unsafe_code)]

use super::*;
use crate::ids::ItemId;
use crate::model::{IssueType, Status, StatusTimestamps, Urgency};

const HOUR: i64 = 60 * 60 * 1000;
// 2026-01-15T10:30:00Z
const NOW_MS: i64 = 1_768_473_000_000;

fn item(id: &str, status: Status, since_ms: i64) -> ProcurementItem {
    let mut stamps = StatusTimestamps::started(Status::NeedToBuy, since_ms);
    stamps.stamp(status, since_ms);
    ProcurementItem {
        id: ItemId::try_new(id).unwrap(),
        name: format!("item {id}"),
        quantity_requested: 5.0,
        quantity_received: 0.0,
        unit: "kg".to_string(),
        supplier: "Makro".to_string(),
        notes: None,
        status,
        urgency: Urgency::Normal,
        issue: false,
        issue_type: None,
        issue_reason: None,
        quality_check: None,
        status_timestamps: stamps,
        last_updated: since_ms,
        history: Vec::new(),
        created_by: None,
        updated_by: None,
    }
}

fn attention_ids(snapshot: &DashboardSnapshot) -> Vec<String> {
    snapshot
        .needs_attention
        .iter()
        .map(|entry| entry.item.id.to_string())
        .collect()
}

#[test]
fn priority_orders_urgent_delayed_then_issue_then_delayed() {
    let mut delayed_only = item("delayed", Status::Ordered, NOW_MS - 7 * HOUR);
    delayed_only.supplier = "Bakery".to_string();

    let mut issue_only = item("issue", Status::Bought, NOW_MS - HOUR);
    issue_only.issue = true;
    issue_only.issue_type = Some(IssueType::NotFresh);

    let mut urgent_delayed = item("urgent", Status::Ordered, NOW_MS - 8 * HOUR);
    urgent_delayed.urgency = Urgency::Urgent;

    let mut items = vec![delayed_only, issue_only, urgent_delayed];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));

    assert_eq!(attention_ids(&snapshot), vec!["urgent", "issue", "delayed"]);
    let priorities = snapshot
        .needs_attention
        .iter()
        .map(|entry| entry.priority)
        .collect::<Vec<_>>();
    assert_eq!(
        priorities,
        vec![Priority::UrgentAndDelayed, Priority::HasIssue, Priority::Delayed]
    );
}

#[test]
fn ties_within_a_tier_are_oldest_first() {
    let mut items = vec![
        item("newer", Status::Ordered, NOW_MS - 7 * HOUR),
        item("older", Status::Ordered, NOW_MS - 9 * HOUR),
    ];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));
    assert_eq!(attention_ids(&snapshot), vec!["older", "newer"]);
    let delayed = snapshot
        .delayed_items
        .iter()
        .map(|item| item.id.to_string())
        .collect::<Vec<_>>();
    assert_eq!(delayed, vec!["older", "newer"]);
}

#[test]
fn urgent_not_delayed_ranks_last() {
    let mut urgent = item("urgent", Status::NeedToBuy, NOW_MS - HOUR);
    urgent.urgency = Urgency::Urgent;
    let mut items = vec![urgent];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));
    assert_eq!(snapshot.needs_attention.len(), 1);
    assert_eq!(snapshot.needs_attention[0].priority, Priority::Other);
    assert_eq!(snapshot.counts.urgent, 1);
    assert!(!snapshot.urgent_items[0].is_delayed);
}

#[test]
fn verified_issues_count_but_do_not_need_attention() {
    let mut verified = item("v", Status::Verified, NOW_MS - HOUR);
    verified.issue = true;
    verified.issue_type = Some(IssueType::WrongItem);
    verified.supplier = "Fresh Market".to_string();

    let mut short = item("short", Status::Received, NOW_MS - HOUR);
    short.quantity_received = 2.0;
    short.supplier = "Corner Shop".to_string();

    let mut items = vec![verified, short];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));

    assert_eq!(snapshot.counts.issues, 2);
    assert_eq!(snapshot.counts.pending, 1);
    assert_eq!(attention_ids(&snapshot), vec!["short"]);
    assert_eq!(snapshot.issues_by_supplier.fresh_market, 1);
    assert_eq!(snapshot.issues_by_supplier.other, 1);
    assert_eq!(snapshot.issues_by_supplier.makro, 0);
    assert_eq!(snapshot.issues_by_supplier.total(), snapshot.counts.issues);
    assert_eq!(snapshot.issues_by_type.get(&IssueType::WrongItem), Some(&1));
    assert_eq!(snapshot.issues_by_type.get(&IssueType::QUANTITY_MISMATCH), Some(&1));
    assert_eq!(snapshot.issues_by_type.values().sum::<usize>(), snapshot.counts.issues);
    assert_eq!(snapshot.counts.receiving, 1);
}

#[test]
fn column_counts_cover_every_board_column() {
    let mut arrived = item("d", Status::Received, NOW_MS - HOUR);
    arrived.quantity_received = arrived.quantity_requested;
    let mut items = vec![
        item("a", Status::NeedToBuy, NOW_MS - HOUR),
        item("b", Status::Ordered, NOW_MS - HOUR),
        item("c", Status::Ordered, NOW_MS - HOUR),
        arrived,
    ];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));

    assert_eq!(snapshot.column_counts.len(), Status::BOARD_COLUMNS.len());
    assert_eq!(snapshot.column_counts[&Status::NeedToBuy], 1);
    assert_eq!(snapshot.column_counts[&Status::Ordered], 2);
    assert_eq!(snapshot.column_counts[&Status::Bought], 0);
    assert_eq!(snapshot.counts.receiving, 1);
    assert!(snapshot.issues_by_type.is_empty());
}

#[test]
fn detection_updates_the_items_passed_in() {
    let mut short = item("short", Status::Received, NOW_MS - HOUR);
    short.quantity_received = 1.0;
    let mut items = vec![short];
    compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));
    assert!(items[0].issue);
    assert_eq!(items[0].issue_type, Some(IssueType::QUANTITY_MISMATCH));
}

#[test]
fn items_outside_range_are_neither_counted_nor_touched() {
    let mut stale = item("stale", Status::Received, NOW_MS - 40 * 24 * HOUR);
    stale.quantity_received = 1.0;
    let fresh = item("fresh", Status::NeedToBuy, NOW_MS - HOUR);
    let mut items = vec![stale, fresh];

    let snapshot = compute_dashboard_data(&mut items, TimeRange::Today, Now::utc(NOW_MS));
    assert_eq!(snapshot.meta.total_items, 1);
    assert_eq!(snapshot.meta.time_range, TimeRange::Today);
    assert_eq!(snapshot.meta.computed_at, NOW_MS);
    assert_eq!(snapshot.counts.issues, 0);
    assert!(!items[0].issue);
}

#[test]
fn repeated_computation_is_identical() {
    let mut urgent = item("u", Status::Bought, NOW_MS - 13 * HOUR);
    urgent.urgency = Urgency::Urgent;
    let mut items = vec![
        urgent,
        item("a", Status::Ordered, NOW_MS - 7 * HOUR),
        item("b", Status::NeedToBuy, NOW_MS - HOUR),
    ];
    let first = compute_dashboard_data(&mut items, TimeRange::Last7Days, Now::utc(NOW_MS));
    let second = compute_dashboard_data(&mut items, TimeRange::Last7Days, Now::utc(NOW_MS));
    assert_eq!(first, second);
    assert!(first.team_workload.is_empty());
}

#[test]
fn snapshot_serializes_with_dashboard_keys() {
    let mut items = vec![item("a", Status::Ordered, NOW_MS - 7 * HOUR)];
    let snapshot = compute_dashboard_data(&mut items, TimeRange::All, Now::utc(NOW_MS));
    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["meta"]["timeRange"], "all");
    assert_eq!(value["counts"]["delayed"], 1);
    assert_eq!(value["needsAttention"][0]["priority"], 3);
    assert_eq!(value["issuesBySupplier"]["FreshMarket"], 0);
    assert!(value["teamWorkload"].as_array().unwrap().is_empty());
}
