//! Input validation for record-creating operations.
//!
//! Identifiers must be non-empty and bounded; free text is only bounded.
//! Principals are never validated: they arrive already authenticated and are
//! treated as opaque.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Default maximum identifier length in bytes.
const DEFAULT_MAX_IDENTIFIER_BYTES: usize = 256;

/// Default maximum free-text length in bytes.
const DEFAULT_MAX_TEXT_BYTES: usize = 4096;

/// Validation error with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: &'static str,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

/// Size limits applied to caller-supplied fields.
///
/// # Validation Rules
///
/// - `max_identifier_bytes` must be > 0
/// - `max_text_bytes` must be > 0
///
/// # Example
///
/// ```no_run
/// # use mortgage_ledger_types::validation::ValidationConfig;
/// let config = ValidationConfig::builder()
///     .max_identifier_bytes(64)
///     .build()
///     .expect("valid validation config");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationConfig {
    /// Maximum identifier length in UTF-8 bytes.
    #[serde(default = "default_max_identifier_bytes")]
    pub max_identifier_bytes: usize,
    /// Maximum free-text length in UTF-8 bytes (addresses, descriptions, open type tags).
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

#[bon::bon]
impl ValidationConfig {
    /// Creates a validation configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if either limit is zero.
    #[builder]
    pub fn new(
        #[builder(default = default_max_identifier_bytes())] max_identifier_bytes: usize,
        #[builder(default = default_max_text_bytes())] max_text_bytes: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { max_identifier_bytes, max_text_bytes };
        config.validate()?;
        Ok(config)
    }
}

impl ValidationConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if either limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_identifier_bytes == 0 {
            return Err(ConfigError::Validation {
                message: "max_identifier_bytes must be > 0".to_string(),
            });
        }
        if self.max_text_bytes == 0 {
            return Err(ConfigError::Validation {
                message: "max_text_bytes must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_identifier_bytes: default_max_identifier_bytes(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

fn default_max_identifier_bytes() -> usize {
    DEFAULT_MAX_IDENTIFIER_BYTES
}

fn default_max_text_bytes() -> usize {
    DEFAULT_MAX_TEXT_BYTES
}

/// Validates a record identifier.
///
/// # Errors
///
/// Returns [`ValidationError`] if the identifier is empty or longer than
/// `config.max_identifier_bytes`.
pub fn validate_identifier(
    field: &'static str,
    value: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError { field, constraint: "must not be empty".to_string() });
    }
    if value.len() > config.max_identifier_bytes {
        return Err(ValidationError {
            field,
            constraint: format!(
                "length {} bytes exceeds maximum {} bytes",
                value.len(),
                config.max_identifier_bytes
            ),
        });
    }
    Ok(())
}

/// Validates free text. Empty text is allowed.
///
/// # Errors
///
/// Returns [`ValidationError`] if the text is longer than `config.max_text_bytes`.
pub fn validate_text(
    field: &'static str,
    value: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    if value.len() > config.max_text_bytes {
        return Err(ValidationError {
            field,
            constraint: format!(
                "length {} bytes exceeds maximum {} bytes",
                value.len(),
                config.max_text_bytes
            ),
        });
    }
    Ok(())
}
