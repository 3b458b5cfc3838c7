//! Resolution of the backend service key.
//!
//! The key can be given three ways, checked in this order:
//!
//! 1. **Inline** in the config file (`"key": "..."`), handy for local runs
//! 2. **File** (`"keyFile": "/run/secrets/supabase_key"`), the Docker secrets layout
//! 3. **Environment variable** (`"keyEnvVar": "SUPABASE_SERVICE_KEY"`)

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source configured (need one of: key, keyFile, keyEnvVar)")]
    NoSourceProvided,

    #[error("Failed to read secret file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// The places a single secret may come from. Empty strings count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    pub direct: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    pub fn new(direct: Option<&'a str>, file_path: Option<&'a str>, env_var: Option<&'a str>) -> Self {
        Self {
            direct: non_empty(direct),
            file_path: non_empty(file_path),
            env_var: non_empty(env_var),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.direct.is_some() || self.file_path.is_some() || self.env_var.is_some()
    }

    /// Resolves the first configured source. A configured source that fails
    /// is an error; later sources are not tried.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = self.direct {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = self.file_path {
            let expanded = expand_home(path);
            let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileRead {
                path: expanded.clone(),
                source: e,
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile { path: expanded });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }

        if let Some(name) = self.env_var {
            return match std::env::var(name) {
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }
}

/// Shorthand for `SecretSource::new(..).resolve()`.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    SecretSource::new(direct, file_path, env_var).resolve()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Expands a leading `~` to the home directory. `~user` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_inline_key_wins_over_env() {
        std::env::set_var("DOCINTAKE_TEST_KEY_1", "from-env");
        let key = resolve_secret(Some("inline"), None, Some("DOCINTAKE_TEST_KEY_1")).unwrap();
        assert_eq!(key.expose_secret(), "inline");
        std::env::remove_var("DOCINTAKE_TEST_KEY_1");
    }

    #[test]
    fn test_file_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  service-key  ").unwrap();
        let path = file.path().to_str().unwrap();

        let key = resolve_secret(None, Some(path), None).unwrap();
        assert_eq!(key.expose_secret(), "service-key");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let err = resolve_secret(None, Some(path), None).unwrap_err();
        assert!(matches!(err, SecretError::EmptyFile { .. }));
    }

    #[test]
    fn test_missing_file_does_not_fall_through_to_env() {
        let err = resolve_secret(None, Some("/nonexistent/key"), Some("PATH")).unwrap_err();
        assert!(matches!(err, SecretError::FileRead { .. }));
    }

    #[test]
    #[serial]
    fn test_env_var_source() {
        std::env::set_var("DOCINTAKE_TEST_KEY_2", "env-key\n");
        let key = resolve_secret(None, None, Some("DOCINTAKE_TEST_KEY_2")).unwrap();
        assert_eq!(key.expose_secret(), "env-key");
        std::env::remove_var("DOCINTAKE_TEST_KEY_2");
    }

    #[test]
    #[serial]
    fn test_env_var_not_set() {
        std::env::remove_var("DOCINTAKE_TEST_KEY_3");
        let err = resolve_secret(None, None, Some("DOCINTAKE_TEST_KEY_3")).unwrap_err();
        assert!(matches!(err, SecretError::EnvVarNotSet { name } if name == "DOCINTAKE_TEST_KEY_3"));
    }

    #[test]
    fn test_empty_strings_count_as_unset() {
        let source = SecretSource::new(Some(""), Some(""), Some(""));
        assert!(!source.is_configured());
        assert!(matches!(source.resolve(), Err(SecretError::NoSourceProvided)));
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        let expanded = expand_home("~/keys/supabase");
        assert!(expanded.starts_with(home.to_string_lossy().as_ref()));
        assert!(expanded.ends_with("keys/supabase"));
        assert_eq!(expand_home("/abs/path"), "/abs/path");
    }
}
