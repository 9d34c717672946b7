//! Configuration validation
//!
//! Collects every problem with a config before failing:
//! - Required credentials are present
//! - Subdomain is a bare label, not a URL
//! - Page size is within the API limit
//! - Request timeout is non-zero
//! - start_date parses
//! - Stream names are known

use super::tap_config::TapConfig;
use crate::streams;
use crate::TapError;
use std::collections::HashSet;

/// Largest `limit` the list endpoints accept
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

pub fn validate_config(config: &TapConfig) -> ValidationResult {
    let mut errors = Vec::new();

    for (field, value) in [
        ("subdomain", &config.subdomain),
        ("email_address", &config.email_address),
        ("api_key", &config.api_key),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "is required"));
        }
    }

    if !config.subdomain.is_empty() && !is_valid_subdomain(&config.subdomain) {
        errors.push(ValidationError::new(
            "subdomain",
            format!(
                "'{}' must be the bare subdomain, e.g. 'acme' for acme.gorgias.com",
                config.subdomain
            ),
        ));
    }

    if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
        errors.push(ValidationError::new(
            "page_size",
            format!(
                "must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, config.page_size
            ),
        ));
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            "must be at least 1 second",
        ));
    }

    if let Err(e) = config.start_date() {
        errors.push(ValidationError::new("start_date", e.to_string()));
    }

    if let Some(ref names) = config.streams {
        let mut seen = HashSet::new();
        for name in names {
            if streams::find(name).is_none() {
                errors.push(ValidationError::new(
                    "streams",
                    format!(
                        "Unknown stream '{}'. Must be one of: {}",
                        name,
                        streams::stream_names().join(", ")
                    ),
                ));
            } else if !seen.insert(name.as_str()) {
                errors.push(ValidationError::new(
                    "streams",
                    format!("Duplicate stream '{}'", name),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_subdomain(subdomain: &str) -> bool {
    subdomain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &TapConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        TapError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TapConfig {
        TapConfig::new("acme", "agent@acme.io", "key")
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let config = TapConfig::new("", "", "");
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["subdomain", "email_address", "api_key"]);
    }

    #[test]
    fn test_subdomain_must_not_be_url() {
        let mut config = valid_config();
        config.subdomain = "acme.gorgias.com".to_string();
        assert!(validate_config(&config).is_err());

        config.subdomain = "https://acme".to_string();
        assert!(validate_config(&config).is_err());

        config.subdomain = "acme-eu".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(validate_config(&valid_config().with_page_size(0)).is_err());
        assert!(validate_config(&valid_config().with_page_size(101)).is_err());
        assert!(validate_config(&valid_config().with_page_size(1)).is_ok());
        assert!(validate_config(&valid_config().with_page_size(100)).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.request_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "request_timeout_secs");

        config.request_timeout_secs = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_start_date() {
        let config = valid_config().with_start_date("01/02/2024");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "start_date");
    }

    #[test]
    fn test_stream_names() {
        assert!(validate_config(&valid_config().with_streams(&["tickets", "messages"])).is_ok());

        let errors =
            validate_config(&valid_config().with_streams(&["tickets", "orders"])).unwrap_err();
        assert!(errors[0].message.contains("Unknown stream 'orders'"));

        let errors =
            validate_config(&valid_config().with_streams(&["tickets", "tickets"])).unwrap_err();
        assert!(errors[0].message.contains("Duplicate stream"));
    }

    #[test]
    fn test_result_joins_messages() {
        let err = validate_config_result(&TapConfig::new("", "a@b.c", "k")).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Configuration validation failed"));
        assert!(text.contains("subdomain: is required"));
    }
}
