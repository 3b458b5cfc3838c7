use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to encode history files: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("History entry '{id}' is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("History request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("History backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid history response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
