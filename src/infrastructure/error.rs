use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("task board is not running")]
    BoardUnavailable,
}

impl InfraError {
    /// Whether the message is safe and useful to show the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
