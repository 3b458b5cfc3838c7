//! History kept in the local SQLite database.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use super::{HistoryEntry, HistoryError, HistoryStore, NewHistoryEntry, Result};
use crate::db::history_repo::{self, HistoryRow};
use crate::db::Database;

#[derive(Clone)]
pub struct SqliteHistoryStore {
    db: Database,
}

impl SqliteHistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

fn to_row(id: String, created_at: DateTime<Utc>, entry: &NewHistoryEntry) -> Result<HistoryRow> {
    Ok(HistoryRow {
        id,
        created_at: created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        files: serde_json::to_string(&entry.files)?,
        status: entry.status.as_str().to_string(),
        message: entry.message.clone(),
        document_type: entry.document_type.clone(),
    })
}

fn from_row(row: HistoryRow) -> Result<HistoryEntry> {
    let corrupt = |reason: String| HistoryError::Corrupt {
        id: row.id.clone(),
        reason,
    };

    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|e| corrupt(format!("created_at: {}", e)))?
        .with_timezone(&Utc);
    let files = serde_json::from_str(&row.files).map_err(|e| corrupt(format!("files: {}", e)))?;
    let status = row.status.parse().map_err(corrupt)?;

    Ok(HistoryEntry {
        id: row.id,
        created_at,
        files,
        status,
        message: row.message,
        document_type: row.document_type,
    })
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn insert(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = to_row(id, Utc::now(), &entry)?;
        history_repo::insert(&self.db, &row)?;
        log::debug!("History entry {} stored ({})", row.id, row.status);
        from_row(row)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        history_repo::list_recent(&self.db, limit)?
            .into_iter()
            .map(from_row)
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(history_repo::delete(&self.db, id)?)
    }

    async fn delete_all(&self) -> Result<usize> {
        let deleted = history_repo::delete_all(&self.db)?;
        log::info!("Cleared {} history entries", deleted);
        Ok(deleted)
    }
}
