#![forbid(unsafe_code)]

mod items;
mod util;

use super::super::super::StoreError;
use rusqlite::Connection;

pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    items::apply(conn)?;
    Ok(())
}
