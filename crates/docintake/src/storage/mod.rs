//! Object storage for renamed documents.

pub mod cleanup;
pub mod memory;
pub mod supabase;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use cleanup::{cleanup_uploads, CleanupReport};
pub use memory::InMemoryObjectStore;
pub use supabase::SupabaseObjectStore;

use crate::sanitize::sanitize_filename;

/// Prefix under which renamed documents are uploaded.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Placeholder object that keeps the uploads folder alive.
pub const KEEP_FILE: &str = ".keep";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Storage request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("'{name}' does not produce a usable storage key")]
    InvalidKey { name: String },

    #[error("Object not found: {path}")]
    NotFound { path: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Replace an existing object at the same key.
    pub upsert: bool,
    /// `Cache-Control` max-age in seconds.
    pub cache_control_secs: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/pdf".to_string(),
            upsert: true,
            cache_control_secs: 3600,
        }
    }
}

impl UploadOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// One entry of a folder listing. Names are relative to the listed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the key it was stored under.
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<String>;

    /// Time-limited URL granting read access to `path`.
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String>;

    /// Direct children of `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>>;

    /// Removes the given keys and returns those that were actually removed.
    async fn remove(&self, paths: &[String]) -> Result<Vec<String>>;
}

/// Builds `<prefix>/<sanitized name>`.
///
/// Fails when sanitization leaves nothing, so a name such as `日本語.pdf`
/// never collapses onto the bare prefix.
pub fn object_key(prefix: &str, name: &str) -> Result<String> {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidKey {
            name: name.to_string(),
        });
    }

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(sanitized)
    } else {
        Ok(format!("{}/{}", prefix, sanitized))
    }
}
