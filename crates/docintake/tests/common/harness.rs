//! A `DocIntake` instance isolated in a temp directory.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use docintake::config::WebhookConfig;
use docintake::db::Database;
use docintake::history::SqliteHistoryStore;
use docintake::pipeline::PipelineConfig;
use docintake::storage::InMemoryObjectStore;
use docintake::{DocIntake, RetryPolicy, SourceFile, WebhookClient};

use super::MockWebhook;

pub struct TestHarness {
    temp_dir: TempDir,
    pub webhook: MockWebhook,
    pub store: Arc<InMemoryObjectStore>,
    pub app: DocIntake,
}

impl TestHarness {
    /// Harness with immediate retries and no pacing.
    pub async fn new() -> Self {
        Self::with_settings(RetryPolicy::immediate(4), Duration::ZERO).await
    }

    pub async fn with_settings(retry: RetryPolicy, pacing: Duration) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let webhook = MockWebhook::new();
        let url = webhook.spawn().await;

        let mut webhook_config = WebhookConfig::new(url);
        webhook_config.request_timeout_secs = 5;
        let remote = Arc::new(WebhookClient::new(&webhook_config).unwrap());

        let store = Arc::new(InMemoryObjectStore::default());
        let db = Database::open(&temp_dir.path().join("history.db")).unwrap();
        let history = Arc::new(SqliteHistoryStore::new(db));

        let app = DocIntake::new(
            PipelineConfig::default().with_pacing_delay(pacing),
            retry,
            remote,
            store.clone(),
            history,
        );

        Self {
            temp_dir,
            webhook,
            store,
            app,
        }
    }

    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    pub fn pdf(name: &str) -> SourceFile {
        SourceFile::from_bytes(name, Some("application/pdf"), format!("%PDF-1.7 {}", name).into_bytes())
    }
}
