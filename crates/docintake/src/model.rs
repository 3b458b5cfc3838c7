//! Files entering the pipeline and the per-file records it produces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Media type used when neither the caller nor the extension tells us better.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Outcome of renaming one file. Serialized with the field names the history
/// table has always used (`original`, `renamed`, `storagePath`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Name of the file as uploaded.
    pub original: String,
    /// Name suggested by the rename service, or `original` when it gave none.
    pub renamed: String,
    /// Object-store key, present only when an upload succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Document type returned by the rename service.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl FileEntry {
    /// Entry for a renamed file. A blank `renamed` falls back to `original`.
    pub fn new(original: impl Into<String>, renamed: impl Into<String>) -> Self {
        let original = original.into();
        let renamed = renamed.into();
        let renamed = if renamed.trim().is_empty() {
            original.clone()
        } else {
            renamed
        };
        Self {
            original,
            renamed,
            storage_path: None,
            document_type: None,
        }
    }

    /// Entry for a file the rename service could not handle.
    pub fn unrenamed(original: impl Into<String>) -> Self {
        let original = original.into();
        Self::new(original.clone(), original)
    }

    pub fn with_storage_path(mut self, path: Option<String>) -> Self {
        self.storage_path = path;
        self
    }

    pub fn with_document_type(mut self, document_type: Option<String>) -> Self {
        self.document_type = document_type.filter(|t| !t.is_empty());
        self
    }

    pub fn was_renamed(&self) -> bool {
        self.renamed != self.original
    }
}

#[derive(Debug, Clone)]
enum SourceContent {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

/// A file handed to the pipeline, either already in memory (browser upload)
/// or on disk and read only when its turn comes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    media_type: Option<String>,
    content: SourceContent,
}

impl SourceFile {
    pub fn from_bytes(name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_string),
            content: SourceContent::Bytes(bytes.into()),
        }
    }

    /// Lazily-read file. The name is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            media_type: None,
            content: SourceContent::Path(path.to_path_buf()),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared media type, else one guessed from the extension.
    pub fn media_type(&self) -> String {
        match &self.media_type {
            Some(declared) if !declared.is_empty() => declared.clone(),
            _ => mime_guess::from_path(&self.name)
                .first_raw()
                .unwrap_or(FALLBACK_MEDIA_TYPE)
                .to_string(),
        }
    }

    /// Loads the content for sending. Path-backed files hit the disk here.
    pub async fn load(&self) -> std::io::Result<FilePayload> {
        let bytes = match &self.content {
            SourceContent::Bytes(bytes) => bytes.to_vec(),
            SourceContent::Path(path) => tokio::fs::read(path).await?,
        };
        Ok(FilePayload {
            name: self.name.clone(),
            media_type: self.media_type(),
            bytes,
        })
    }
}

/// A loaded file, ready to be sent to the rename service or the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}
