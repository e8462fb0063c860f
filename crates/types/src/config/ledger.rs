//! Ledger initialization configuration.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::{ConfigError, ParseSnafu, ReadSnafu};
use crate::{types::Principal, validation::ValidationConfig};

/// Configuration a ledger is constructed from.
///
/// The owner is fixed for the lifetime of the ledger. `verifiers` seeds the
/// verifier set at construction; afterwards only the owner can extend it.
///
/// # Validation Rules
///
/// - `owner` must not be empty
/// - every entry in `verifiers` must not be empty
/// - `validation` limits must be > 0
///
/// # Example
///
/// ```no_run
/// # use mortgage_ledger_types::config::LedgerConfig;
/// let config = LedgerConfig::builder()
///     .owner("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM")
///     .verifiers(vec!["ST3PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".into()])
///     .build()
///     .expect("valid ledger config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerConfig {
    /// The single owner principal.
    pub owner: Principal,
    /// Principals granted the verifier role at construction.
    #[serde(default)]
    pub verifiers: Vec<Principal>,
    /// Size limits for caller-supplied fields.
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[bon::bon]
impl LedgerConfig {
    /// Creates a new ledger configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the owner or any verifier is
    /// empty, or if a validation limit is zero.
    #[builder]
    pub fn new(
        #[builder(into)] owner: Principal,
        #[builder(default)] verifiers: Vec<Principal>,
        #[builder(default)] validation: ValidationConfig,
    ) -> Result<Self, ConfigError> {
        let config = Self { owner, verifiers, validation };
        config.validate()?;
        Ok(config)
    }
}

impl LedgerConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.as_str().is_empty() {
            return Err(ConfigError::Validation { message: "owner must not be empty".to_string() });
        }
        if let Some(pos) = self.verifiers.iter().position(|v| v.as_str().is_empty()) {
            return Err(ConfigError::Validation {
                message: format!("verifiers[{pos}] must not be empty"),
            });
        }
        self.validation.validate()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed, or
    /// [`ConfigError::Validation`] if a value is out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).context(ParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the errors of [`LedgerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .context(ReadSnafu { path: path.display().to_string() })?;
        Self::from_toml_str(&contents)
    }
}
