//! CRUD for the `file_history` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw history row. `files` is the JSON array of file entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: String,
    pub created_at: String,
    pub files: String,
    pub status: String,
    pub message: Option<String>,
    pub document_type: Option<String>,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            files: row.get("files")?,
            status: row.get("status")?,
            message: row.get("message")?,
            document_type: row.get("document_type")?,
        })
    }
}

pub fn insert(db: &Database, row: &HistoryRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO file_history (id, created_at, files, status, message, document_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.created_at,
                row.files,
                row.status,
                row.message,
                row.document_type,
            ],
        )?;
        Ok(())
    })
}

/// Newest first. Rows inserted in the same instant keep insertion order
/// reversed.
pub fn list_recent(db: &Database, limit: u32) -> Result<Vec<HistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM file_history ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], HistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns whether a row was deleted.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM file_history WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

/// Returns the number of deleted rows.
pub fn delete_all(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| Ok(conn.execute("DELETE FROM file_history", [])?))
}
