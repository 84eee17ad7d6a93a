//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DevupConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and environment resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("missing required environment keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("cannot read dotenv file {path}: {reason}")]
    Dotenv { path: String, reason: String },

    #[error("cannot render '{template}': {reason}")]
    Template { template: String, reason: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DevupConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: DevupConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<DevupConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "Config file not found, using defaults");
    let config = DevupConfig::default();
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            env_file = "local.env"

            [environment]
            DB_USER = "root"

            [engine]
            command = "podman-compose"
            project_dir = "deploy"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.command, "podman-compose");
        assert_eq!(config.engine.project_dir.as_deref(), Some("deploy"));
        assert_eq!(config.env_file, "local.env");
        assert_eq!(config.environment["DB_USER"], "root");
        assert_eq!(config.services.len(), 2);
    }

    #[test]
    fn test_load_rejects_invalid_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[services]]
            name = "api"
            probe = {{ kind = "http", url = "http://localhost/health" }}
            retry = {{ max_attempts = 0 }}
            "#
        )
        .unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroAttempts("api".into())]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services = 3").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("devup.toml")).unwrap();
        assert_eq!(config.services.len(), 2);

        assert!(matches!(
            load_config(&dir.path().join("devup.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
