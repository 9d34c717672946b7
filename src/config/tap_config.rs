//! Tap configuration file handling

use crate::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use singer::{PropertiesList, Property, PropertyType};
use std::fs;
use std::path::Path;

/// Prefix for environment overrides (e.g. `TAP_GORGIAS_API_KEY`)
pub const ENV_PREFIX: &str = "TAP_GORGIAS_";

fn default_page_size() -> u32 {
    100
}

fn default_max_retries() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    300
}

/// Settings shared by every stream
///
/// Required string fields default to empty so that validation can report
/// every missing field at once instead of failing on the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Account subdomain (`<subdomain>.gorgias.com`)
    #[serde(default)]
    pub subdomain: String,

    /// Email address to authenticate with
    #[serde(default)]
    pub email_address: String,

    /// API key generated by the user
    #[serde(default)]
    pub api_key: String,

    /// Earliest record date to sync (RFC 3339 or YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Page size for each list endpoint call
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Streams to sync when no catalog is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<Vec<String>>,
}

impl TapConfig {
    pub fn new(
        subdomain: impl Into<String>,
        email_address: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            subdomain: subdomain.into(),
            email_address: email_address.into(),
            api_key: api_key.into(),
            start_date: None,
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout(),
            streams: None,
        }
    }

    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_streams(mut self, streams: &[&str]) -> Self {
        self.streams = Some(streams.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Load, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides(std::env::vars())?;
        super::validate_config_result(&config)?;
        Ok(config)
    }

    /// Parse a config file without overrides or validation
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::TapError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading tap configuration");

        let content = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Self = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        tracing::debug!(
            subdomain = %config.subdomain,
            page_size = config.page_size,
            "Configuration parsed"
        );

        Ok(config)
    }

    /// Overlay `TAP_GORGIAS_*` variables onto the file values
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field {
                "SUBDOMAIN" => self.subdomain = value,
                "EMAIL_ADDRESS" => self.email_address = value,
                "API_KEY" => self.api_key = value,
                "START_DATE" => self.start_date = Some(value),
                "PAGE_SIZE" => {
                    self.page_size = value.trim().parse().map_err(|_| {
                        crate::TapError::Config(format!(
                            "{}PAGE_SIZE must be an integer, got '{}'",
                            ENV_PREFIX, value
                        ))
                    })?;
                }
                _ => continue,
            }
            tracing::debug!(variable = %key, "Applied environment override");
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.gorgias.com", self.subdomain)
    }

    /// Parsed `start_date`, if configured
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        match self.start_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_start_date(raw).map(Some),
        }
    }
}

fn parse_start_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            crate::TapError::Config(format!(
                "Invalid start_date '{}': expected RFC 3339 or YYYY-MM-DD",
                raw
            ))
        })
}

/// JSON schema of the accepted settings, printed by `--about`
pub fn settings_schema() -> Value {
    PropertiesList::new()
        .with(
            Property::new("subdomain", PropertyType::String)
                .required()
                .with_description("Subdomain (<subdomain>.gorgias.com)"),
        )
        .with(
            Property::new("email_address", PropertyType::String)
                .required()
                .with_description("Email address to authenticate with"),
        )
        .with(
            Property::new("api_key", PropertyType::String)
                .required()
                .with_description("API key generated by the user"),
        )
        .with(
            Property::new("start_date", PropertyType::DateTime)
                .with_description("The earliest record date to sync"),
        )
        .with(
            Property::new("page_size", PropertyType::Integer)
                .with_description("The page size for each list endpoint call (default 100)"),
        )
        .with(
            Property::new("max_retries", PropertyType::Integer)
                .with_description("Retries for transient API failures (default 5)"),
        )
        .with(
            Property::new("request_timeout_secs", PropertyType::Integer)
                .with_description("Per-request timeout in seconds (default 300)"),
        )
        .with(
            Property::new("streams", PropertyType::array(PropertyType::String))
                .with_description("Streams to sync when no catalog is supplied"),
        )
        .to_schema()
}
