use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriorityError {
    #[error("Malformed ancestry '{input}': {reason}")]
    Format { input: String, reason: String },

    #[error("Leisure not found: {id}")]
    NotFound { id: i64 },

    #[error("Parent leisure not found: {id}")]
    ParentNotFound { id: i64 },

    #[error("Transaction failed during {operation}: {reason}")]
    Transaction {
        operation: &'static str,
        reason: String,
    },

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

impl PriorityError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        PriorityError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PriorityError>;
