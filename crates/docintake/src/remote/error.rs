use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to rename service failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rename service returned no file name")]
    EmptyName,

    #[error("Classification error: empty response")]
    EmptyClassification,
}

impl RemoteError {
    /// Transport failures and non-2xx answers. An empty or malformed 2xx
    /// body is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Client(_) | RemoteError::Network(_) | RemoteError::Status { .. }
        )
    }
}

/// Maximum length kept from an error response body.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates a response body so a misbehaving endpoint cannot flood the logs.
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}
