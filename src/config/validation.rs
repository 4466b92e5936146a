//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that URL paths are local and absolute
//! - Validate value ranges (ttl > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    check_local_path(&mut errors, "static_files.url_prefix", &config.static_files.url_prefix);
    if config.static_files.url_prefix == "/" {
        errors.push(ValidationError::new(
            "static_files.url_prefix",
            "must not shadow every route",
        ));
    }

    if config.csrf.ttl_secs == 0 {
        errors.push(ValidationError::new("csrf.ttl_secs", "must be greater than 0"));
    }

    if config.auth.session_cookie.is_empty()
        || !config
            .auth
            .session_cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "auth.session_cookie",
            "must be a non-empty token of letters, digits, `_` or `-`",
        ));
    }
    check_local_path(&mut errors, "auth.signin_path", &config.auth.signin_path);
    check_local_path(&mut errors, "auth.default_redirect", &config.auth.default_redirect);

    if crate::observability::logging::parse_level(&config.observability.log_level).is_none() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level `{}`", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_local_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') || value.starts_with("//") {
        errors.push(ValidationError::new(
            field,
            format!("`{}` must be an absolute local path", value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.static_files.url_prefix = "static".into();
        config.csrf.ttl_secs = 0;
        config.auth.signin_path = "//evil.example".into();
        config.observability.log_level = "LOUD".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "static_files.url_prefix",
                "csrf.ttl_secs",
                "auth.signin_path",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }

    #[test]
    fn test_root_static_prefix_rejected() {
        let mut config = AppConfig::default();
        config.static_files.url_prefix = "/".into();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.auth.session_cookie = "bad cookie".into();
        assert!(validate_config(&config).is_err());
    }
}
