//! Entry point for a UI shell: every user action maps to one method.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{Config, HistoryBackend, StorageBackend};
use crate::db::Database;
use crate::error::{ConfigError, Result};
use crate::history::{HistoryEntry, HistoryStore, SqliteHistoryStore, SupabaseHistoryStore};
use crate::model::{FileEntry, SourceFile};
use crate::pipeline::{
    filter_accepted, BroadcastProgress, ClassifyOutcome, Intake, Pipeline, PipelineConfig,
    PipelineError, ProgressEvent, RenameOutcome, ReviewBatch, RunState,
};
use crate::remote::{RenameService, WebhookClient};
use crate::retry::RetryPolicy;
use crate::sanitize::redact_url;
use crate::storage::{
    cleanup_uploads, CleanupReport, InMemoryObjectStore, ObjectStore, StorageError,
    SupabaseObjectStore,
};
use crate::supabase::SupabaseClient;

pub struct DocIntake {
    pipeline: Pipeline,
    store: Arc<dyn ObjectStore>,
    history: Arc<dyn HistoryStore>,
    progress: BroadcastProgress,
}

impl DocIntake {
    /// Builds the webhook client and the configured storage and history
    /// backends.
    pub fn from_config(config: &Config) -> Result<Self> {
        let supabase = if config.needs_supabase() {
            let section = config.supabase.as_ref().ok_or_else(|| ConfigError::Validation {
                message: "supabase section missing".to_string(),
            })?;
            let key = section.resolve_key()?;
            let client = SupabaseClient::new(&section.url, key).map_err(StorageError::Client)?;
            tracing::info!("Using Supabase project {}", redact_url(&section.url));
            Some(Arc::new(client))
        } else {
            None
        };
        let supabase_client = || {
            supabase.clone().ok_or_else(|| ConfigError::Validation {
                message: "supabase section missing".to_string(),
            })
        };

        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Supabase => Arc::new(SupabaseObjectStore::new(
                supabase_client()?,
                config.storage.bucket.clone(),
            )),
            StorageBackend::Memory => {
                Arc::new(InMemoryObjectStore::new(config.storage.bucket.clone()))
            }
        };

        let history: Arc<dyn HistoryStore> = match config.history.backend {
            HistoryBackend::Sqlite => {
                let path = config.history.resolved_database_path().ok_or_else(|| {
                    ConfigError::Validation {
                        message: "history.databasePath is required when no home directory is available"
                            .to_string(),
                    }
                })?;
                Arc::new(SqliteHistoryStore::new(Database::open(&path)?))
            }
            HistoryBackend::Supabase => Arc::new(SupabaseHistoryStore::new(
                supabase_client()?,
                config.history.table.clone(),
            )),
        };

        let remote = Arc::new(WebhookClient::new(&config.webhook)?);

        Ok(Self::new(
            PipelineConfig::from_config(config),
            config.retry.policy(),
            remote,
            store,
            history,
        ))
    }

    pub fn new(
        config: PipelineConfig,
        retry: RetryPolicy,
        remote: Arc<dyn RenameService>,
        store: Arc<dyn ObjectStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(config, retry, remote, store.clone(), history.clone()),
            store,
            history,
            progress: BroadcastProgress::default(),
        }
    }

    /// Progress of every run started through this instance.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    pub fn run_state(&self) -> RunState {
        self.pipeline.run_state()
    }

    /// Splits dropped files into PDFs to process and rejected ones.
    pub fn intake(&self, files: Vec<SourceFile>) -> Intake {
        filter_accepted(files)
    }

    pub async fn rename(&self, files: Vec<SourceFile>) -> Result<RenameOutcome> {
        Ok(self.pipeline.rename(files, &self.progress).await?)
    }

    pub async fn classify(&self, batch: &ReviewBatch) -> Result<ClassifyOutcome> {
        Ok(self.pipeline.classify(batch, &self.progress).await?)
    }

    /// Signed URL to view a stored file.
    pub async fn preview_url(&self, entry: &FileEntry) -> Result<String> {
        let path = entry
            .storage_path
            .as_deref()
            .ok_or_else(|| PipelineError::PreviewUnavailable {
                file: entry.renamed.clone(),
            })?;
        let url = self
            .store
            .create_signed_url(path, self.pipeline.config().signed_url_ttl)
            .await?;
        tracing::debug!("Preview URL for {}: {}", path, redact_url(&url));
        Ok(url)
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .history
            .list_recent(self.pipeline.config().history_limit)
            .await?)
    }

    pub async fn delete_history_entry(&self, id: &str) -> Result<bool> {
        Ok(self.history.delete(id).await?)
    }

    pub async fn delete_all_history(&self) -> Result<usize> {
        Ok(self.history.delete_all().await?)
    }

    /// Empties the uploads folder.
    pub async fn cleanup_storage(&self) -> Result<CleanupReport> {
        Ok(cleanup_uploads(self.store.as_ref(), &self.pipeline.config().prefix).await?)
    }
}
