#![forbid(unsafe_code)]

//! SQLite persistence for the procurement board.

mod store;

pub use store::{DB_FILE_NAME, SqliteStore, StoreError};
