//! Configuration system
//!
//! Loads the tap config file (JSON, or YAML by extension), applies
//! `TAP_GORGIAS_*` environment overrides and validates the result.

mod tap_config;
pub mod validation;

pub use tap_config::{settings_schema, TapConfig, ENV_PREFIX};
pub use validation::{validate_config, validate_config_result, ValidationError};
