#![forbid(unsafe_code)]

// The first-generation column set. Everything newer is added by
// `migrations::items` so old databases and new ones converge.
pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS purchase_items (
          id TEXT PRIMARY KEY,
          item_name TEXT NOT NULL,
          quantity REAL NOT NULL DEFAULT 0,
          unit TEXT NOT NULL DEFAULT '',
          supplier TEXT NOT NULL DEFAULT '',
          status TEXT NOT NULL DEFAULT 'need-to-buy'
        );
"#;
