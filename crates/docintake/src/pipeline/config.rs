use std::time::Duration;

use crate::config::Config;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::storage::UPLOADS_PREFIX;

/// Runtime settings of a pipeline, resolved from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Object-store folder receiving renamed files.
    pub prefix: String,
    /// Pause between two files of a batch.
    pub pacing_delay: Duration,
    pub signed_url_ttl: Duration,
    pub history_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prefix: UPLOADS_PREFIX.to_string(),
            pacing_delay: Duration::from_millis(100),
            signed_url_ttl: Duration::from_secs(3600),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.storage.prefix.clone(),
            pacing_delay: Duration::from_millis(config.pipeline.pacing_delay_ms),
            signed_url_ttl: Duration::from_secs(config.pipeline.signed_url_ttl_secs),
            history_limit: config.history.limit,
        }
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }
}
