//! Document intake: PDFs are renamed and classified by a remote webhook,
//! stored in an object store, and every run is logged to a history table.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod remote;
pub mod retry;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod supabase;
pub mod telemetry;

pub use app::DocIntake;
pub use config::{load_config, load_config_from_str, Config};
pub use error::{ConfigError, DocIntakeError, Result};
pub use history::{HistoryEntry, HistoryStatus, HistoryStore, NewHistoryEntry};
pub use model::{FileEntry, SourceFile};
pub use pipeline::{
    ClassifyItem, ClassifyOutcome, Pipeline, PipelineConfig, PipelineError, PipelineWarning,
    ProgressEvent, RenameOutcome, ReviewBatch, RunState,
};
pub use remote::{RemoteError, RenameService, RenameSuggestion, WebhookClient};
pub use retry::{RetryError, RetryPolicy};
pub use secrets::{resolve_secret, SecretError};
pub use storage::{ObjectStore, StorageError};
pub use telemetry::init_tracing;
