#![forbid(unsafe_code)]

mod core;
mod history;
mod indexes;
mod items;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(items::SQL);
    sql.push_str(history::SQL);
    sql.push_str(indexes::SQL);
    sql
}
