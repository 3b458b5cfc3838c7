use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::FileEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Pending,
    /// Rename run finished.
    Success,
    /// Classify run finished.
    Classified,
    Error,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Pending => "pending",
            HistoryStatus::Success => "success",
            HistoryStatus::Classified => "classified",
            HistoryStatus::Error => "error",
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HistoryStatus::Pending),
            "success" => Ok(HistoryStatus::Success),
            "classified" => Ok(HistoryStatus::Classified),
            "error" => Ok(HistoryStatus::Error),
            other => Err(format!("unknown history status '{}'", other)),
        }
    }
}

/// A stored history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileEntry>,
    pub status: HistoryStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
}

/// The `files` column is nullable.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FileEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FileEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl HistoryEntry {
    /// The message split on `|`, one line per classified file.
    pub fn message_lines(&self) -> Vec<&str> {
        self.message
            .as_deref()
            .map(|message| {
                message
                    .split('|')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Insert payload for a history store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewHistoryEntry {
    pub files: Vec<FileEntry>,
    pub status: HistoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl NewHistoryEntry {
    /// The document type is taken from the first file.
    pub fn new(files: Vec<FileEntry>, status: HistoryStatus) -> Self {
        let document_type = files.first().and_then(|f| f.document_type.clone());
        Self {
            files,
            status,
            message: None,
            document_type,
        }
    }

    /// Sets the message; an empty one is dropped.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.is_empty()).then_some(message);
        self
    }
}
