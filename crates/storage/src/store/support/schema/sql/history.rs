#![forbid(unsafe_code)]

// Append-only. Rows are only ever removed by a quick-receive undo.
pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS purchase_history (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          record_id TEXT NOT NULL UNIQUE,
          item_id TEXT NOT NULL,
          item_name TEXT NOT NULL,
          supplier TEXT NOT NULL,
          quantity REAL NOT NULL,
          unit TEXT NOT NULL,
          status TEXT NOT NULL,
          issue_type TEXT,
          issue_reason TEXT,
          receiver TEXT,
          created_at_ms INTEGER NOT NULL
        );
"#;
