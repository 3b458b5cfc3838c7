pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    Config, HistoryBackend, HistoryConfig, LogFormat, LoggingConfig, PipelineSettings,
    RetryConfig, StorageBackend, StorageConfig, SupabaseConfig, WebhookConfig,
};
