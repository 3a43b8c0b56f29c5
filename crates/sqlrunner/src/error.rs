use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Only SELECT queries are allowed by default.")]
    NotReadonly,

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("failed to open database: {path}: {source}")]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Engine-level failure; the message is passed through to callers untouched.
    #[error("{0}")]
    SqlError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::SqlError(e.to_string())
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::NotReadonly => "NOT_READONLY",
            AppError::TableNotFound(_) => "TABLE_NOT_FOUND",
            AppError::DbOpenFailed { .. } => "DB_OPEN_FAILED",
            AppError::SqlError(_) => "SQL_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
