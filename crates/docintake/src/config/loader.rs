use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    validate_http_url("webhook.url", &config.webhook.url)?;

    if config.retry.max_delay_ms < config.retry.min_delay_ms {
        return Err(ConfigError::Validation {
            message: format!(
                "retry.maxDelayMs ({}) is below retry.minDelayMs ({})",
                config.retry.max_delay_ms, config.retry.min_delay_ms
            ),
        });
    }

    if config.needs_supabase() {
        let supabase = config.supabase.as_ref().ok_or_else(|| ConfigError::Validation {
            message: "A supabase section is required by the storage or history backend"
                .to_string(),
        })?;
        validate_http_url("supabase.url", &supabase.url)?;
        if !supabase.key_source().is_configured() {
            return Err(ConfigError::Validation {
                message: "supabase needs one of: key, keyFile, keyEnvVar".to_string(),
            });
        }
    }

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.logging.level) {
        return Err(ConfigError::Validation {
            message: format!("Invalid logging.level '{}': {}", config.logging.level, e),
        });
    }

    Ok(())
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HistoryBackend, LogFormat, StorageBackend};
    use std::time::Duration;

    const MINIMAL: &str = r#"
    {
        "version": "1.0",
        "webhook": { "url": "https://hooks.example.com/webhook/renom-doc" },
        "storage": { "backend": "memory" }
    }
    "#;

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();

        assert_eq!(config.webhook.connect_timeout_secs, 10);
        assert_eq!(config.webhook.request_timeout_secs, 120);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.pipeline.pacing_delay_ms, 100);
        assert_eq!(config.pipeline.signed_url_ttl_secs, 3600);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.bucket, "documents");
        assert_eq!(config.storage.prefix, "uploads");
        assert_eq!(config.history.backend, HistoryBackend::Sqlite);
        assert_eq!(config.history.table, "file_history");
        assert_eq!(config.history.limit, 50);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_retry_section_builds_policy() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "http://localhost:5678/webhook" },
                "retry": { "maxAttempts": 2, "minDelayMs": 10, "factor": 3, "maxDelayMs": 50 },
                "storage": { "backend": "memory" }
            }"#,
        )
        .unwrap();

        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(30));
        assert_eq!(policy.delay_after(3), Duration::from_millis(50));
    }

    #[test]
    fn test_full_supabase_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/webhook/renom-doc" },
                "storage": { "backend": "supabase", "bucket": "documents" },
                "history": { "backend": "supabase" },
                "supabase": { "url": "https://abc.supabase.co", "keyEnvVar": "SUPABASE_KEY" },
                "logging": { "level": "docintake=debug,info", "format": "json" }
            }"#,
        )
        .unwrap();

        assert!(config.needs_supabase());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.supabase.unwrap().key_env_var.as_deref(),
            Some("SUPABASE_KEY")
        );
    }

    #[test]
    fn test_supabase_backend_requires_section() {
        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/x" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_supabase_requires_key_source() {
        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/x" },
                "supabase": { "url": "https://abc.supabase.co" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("keyEnvVar"));
    }

    #[test]
    fn test_schema_rejects_unknown_fields_and_bad_values() {
        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/x", "retries": 3 },
                "storage": { "backend": "memory" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));

        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/x" },
                "retry": { "maxAttempts": 0 },
                "storage": { "backend": "memory" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_rejects_non_http_webhook() {
        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "ftp://hooks.example.com/x" },
                "storage": { "backend": "memory" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field, .. } if field == "webhook.url"));
    }

    #[test]
    fn test_rejects_inverted_retry_delays() {
        let err = load_config_from_str(
            r#"{
                "version": "1.0",
                "webhook": { "url": "https://hooks.example.com/x" },
                "retry": { "minDelayMs": 5000, "maxDelayMs": 100 },
                "storage": { "backend": "memory" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("maxDelayMs"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docintake.json");
        std::fs::write(&path, MINIMAL).unwrap();

        assert!(load_config(&path).is_ok());
        assert!(matches!(
            load_config(dir.path().join("missing.json")),
            Err(ConfigError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            load_config_from_str("{ not json"),
            Err(ConfigError::ParseJson(_))
        ));
    }
}
