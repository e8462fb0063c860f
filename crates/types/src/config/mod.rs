//! Configuration types for the mortgage ledger.
//!
//! Configuration is loaded from TOML. Config structs validate their values
//! at construction time via fallible builders; post-deserialization
//! validation is available via the `validate()` method on each struct.

// The schemars `JsonSchema` derive macro internally uses `.unwrap()` in its
// expansions.
#![allow(clippy::disallowed_methods)]

mod ledger;

pub use ledger::*;
use snafu::Snafu;

/// Configuration error.
///
/// Returned when a configuration value is outside its valid range, when a
/// document cannot be parsed, or when a file cannot be read.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// The TOML document could not be parsed.
    #[snafu(display("failed to parse config: {source}"))]
    Parse {
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The configuration file could not be read.
    #[snafu(display("failed to read config file {path}: {source}"))]
    Read {
        /// File path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
