#![forbid(unsafe_code)]

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("unknown id")]
    UnknownId,
    #[error("corrupt row {id}: {message}")]
    CorruptRow { id: String, message: String },
}

impl StoreError {
    pub(crate) fn corrupt(id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::CorruptRow {
            id: id.into(),
            message: message.to_string(),
        }
    }
}
