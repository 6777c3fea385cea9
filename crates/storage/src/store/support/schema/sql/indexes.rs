#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_purchase_history_created ON purchase_history(created_at_ms);
        CREATE INDEX IF NOT EXISTS idx_purchase_history_item ON purchase_history(item_id);
"#;
