//! The rolling log of pipeline runs.

pub mod entry;
pub mod error;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;

pub use entry::{HistoryEntry, HistoryStatus, NewHistoryEntry};
pub use error::{HistoryError, Result};
pub use sqlite::SqliteHistoryStore;
pub use supabase::SupabaseHistoryStore;

/// How many entries the history view shows.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stores a new entry. The store assigns `id` and `created_at`.
    async fn insert(&self, entry: NewHistoryEntry) -> Result<HistoryEntry>;

    /// Most recent entries first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>>;

    /// Returns whether an entry was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Returns the number of deleted entries.
    async fn delete_all(&self) -> Result<usize>;
}
