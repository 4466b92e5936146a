//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.static_files.url_prefix, "/static");
        assert_eq!(config.csrf.ttl_secs, 600);
        assert_eq!(config.auth.session_cookie, "session");
        assert_eq!(config.auth.default_redirect, "/dashboard");
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [csrf]
            ttl_secs = 30

            [observability]
            log_level = "DEBUG"
            json_logs = true
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.csrf.ttl().as_secs(), 30);
        assert!(config.observability.json_logs);
        assert_eq!(config.auth.signin_path, "/signin");
    }

    #[test]
    fn test_parse_and_validation_errors() {
        assert!(matches!(
            parse_config("[listener\n"),
            Err(ConfigError::Parse(_))
        ));

        let err = parse_config("[csrf]\nttl_secs = 0\n").unwrap_err();
        assert!(matches!(&err, ConfigError::Validation(errors) if errors.len() == 1));
        assert!(err.to_string().contains("csrf.ttl_secs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\nsecure_cookies = true").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.auth.secure_cookies);

        assert!(matches!(
            load_config(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
