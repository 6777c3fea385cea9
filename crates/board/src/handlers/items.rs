#![forbid(unsafe_code)]

use super::{HandlerResult, item_json, items_json};
use crate::{
    Args, Board, ai_error, ai_ok, board_error, optional_enum, optional_i64, optional_string,
    require_enum, require_f64, require_id, require_ids, require_string, sync_error,
};
use kb_core::{
    BoardError, ItemEdit, NewItem, Status, TimeRange, Urgency, selectors, store::retention_ms,
};
use serde_json::json;

struct ItemFields {
    name: String,
    quantity: f64,
    unit: String,
    supplier: String,
    urgency: Urgency,
    notes: Option<String>,
}

fn item_fields(args: &Args) -> Result<ItemFields, serde_json::Value> {
    Ok(ItemFields {
        name: require_string(args, "name")?,
        quantity: require_f64(args, "quantity")?,
        unit: optional_string(args, "unit")?.unwrap_or_default(),
        supplier: optional_string(args, "supplier")?.unwrap_or_default(),
        urgency: optional_enum(args, "urgency")?.unwrap_or_default(),
        notes: optional_string(args, "notes")?,
    })
}

impl Board {
    pub(super) fn create_item(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let fields = item_fields(args)?;
        let input = NewItem {
            name: fields.name,
            quantity: fields.quantity,
            unit: fields.unit,
            supplier: fields.supplier,
            urgency: fields.urgency,
            notes: fields.notes,
        };
        let item = self.session.create_item(input, now_ms).map_err(sync_error)?;
        Ok(ai_ok("create_item", json!({ "item": item_json(&item)? })))
    }

    pub(super) fn edit_item(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let fields = item_fields(args)?;
        let edit = ItemEdit {
            name: fields.name,
            quantity: fields.quantity,
            unit: fields.unit,
            supplier: fields.supplier,
            urgency: fields.urgency,
            notes: fields.notes,
        };
        let item = self.session.edit_item(&id, edit, now_ms).map_err(sync_error)?;
        Ok(ai_ok("edit_item", json!({ "item": item_json(&item)? })))
    }

    pub(super) fn duplicate_item(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let item = self.session.duplicate_item(&id, now_ms).map_err(sync_error)?;
        Ok(ai_ok("duplicate_item", json!({ "item": item_json(&item)? })))
    }

    pub(super) fn get_item(&mut self, args: &Args) -> HandlerResult {
        let id = require_id(args, "id")?;
        let Some(item) = self.session.store().get(&id) else {
            return Err(board_error(&BoardError::UnknownItem(id)));
        };
        Ok(ai_ok("get_item", json!({ "item": item_json(item)? })))
    }

    /// Board listing with the same filters the board view offers.
    pub(super) fn list_items(&mut self, args: &Args) -> HandlerResult {
        let now = self.now(args)?;
        let status = optional_enum::<Status>(args, "status")?;
        let range = optional_enum::<TimeRange>(args, "range")?.unwrap_or(TimeRange::All);
        let supplier = optional_string(args, "supplier")?;
        let search = optional_string(args, "search")?.unwrap_or_default();

        let items = self.session.store().items();
        let in_range = selectors::filter_by_time_range(items, range, now);
        let by_status = selectors::filter_by_status(in_range, status);
        let by_supplier = selectors::filter_by_supplier(by_status, supplier.as_deref());
        let found = selectors::filter_by_search(by_supplier, &search);
        Ok(ai_ok(
            "list_items",
            json!({
                "count": found.len(),
                "items": items_json(found)?,
            }),
        ))
    }

    pub(super) fn transition(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let to = require_enum::<Status>(args, "status")?;
        let item = self.session.transition(&id, to, now_ms).map_err(sync_error)?;
        Ok(ai_ok("transition", json!({ "item": item_json(&item)? })))
    }

    pub(super) fn set_urgency(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let ids = require_ids(args, "ids")?;
        let urgency = require_enum::<Urgency>(args, "urgency")?;
        let changed = self
            .session
            .set_urgency(&ids, urgency, now_ms)
            .map_err(sync_error)?;
        Ok(ai_ok(
            "set_urgency",
            json!({ "changed": changed.len(), "items": items_json(&changed)? }),
        ))
    }

    pub(super) fn advance(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let ids = require_ids(args, "ids")?;
        let moved = self.session.advance(&ids, now_ms).map_err(sync_error)?;
        Ok(ai_ok(
            "advance",
            json!({ "moved": moved.len(), "items": items_json(&moved)? }),
        ))
    }

    pub(super) fn verify_received(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let verified = self.session.verify_received(now_ms);
        Ok(ai_ok(
            "verify_received",
            json!({ "verified": verified.len(), "items": items_json(&verified)? }),
        ))
    }

    pub(super) fn delete_item(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let id = require_id(args, "id")?;
        let removed = self.session.delete_item(&id, now_ms).map_err(sync_error)?;
        Ok(ai_ok("delete_item", json!({ "deleted": removed.id })))
    }

    pub(super) fn delete_items(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let ids = require_ids(args, "ids")?;
        let removed = self.session.delete_items(&ids, now_ms);
        Ok(ai_ok(
            "delete_items",
            json!({ "deleted": removed, "missing": ids.len() - removed.len() }),
        ))
    }

    /// Retention sweep; `retention_days` overrides the configured period.
    pub(super) fn sweep_completed(&mut self, args: &Args) -> HandlerResult {
        let now_ms = self.now_ms(args)?;
        let retention = match optional_i64(args, "retention_days")? {
            Some(days) if days < 0 => {
                return Err(ai_error("INVALID_INPUT", "retention_days must not be negative"));
            }
            Some(days) => retention_ms(days),
            None => self.config.retention_ms(),
        };
        let removed = self.session.sweep_completed(now_ms, retention);
        Ok(ai_ok("sweep_completed", json!({ "deleted": removed })))
    }
}
