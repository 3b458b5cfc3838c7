//! Client for the rename/classify webhook.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::WebhookClient;
pub use error::RemoteError;
pub use types::{Action, RenameSuggestion};

use crate::model::FilePayload;

/// The remote service that names and files documents.
#[async_trait]
pub trait RenameService: Send + Sync {
    /// Asks for a name and a document type for `file`.
    async fn rename(&self, file: &FilePayload) -> Result<RenameSuggestion, RemoteError>;

    /// Asks the service to file the document. Returns the service's free-text
    /// report (e.g. where it put the file).
    async fn classify(
        &self,
        file: &FilePayload,
        new_name: &str,
        document_type: Option<&str>,
        original_name: Option<&str>,
    ) -> Result<String, RemoteError>;
}
