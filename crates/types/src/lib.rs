//! Core types, errors, and configuration for the mortgage ledger registries.
//!
//! This crate provides the foundational types shared by every registry:
//! - Newtype identifiers for principals, properties, payments, loans, and recovery actions
//! - Record types with enum-typed lifecycle states
//! - Error taxonomy with stable numeric codes using snafu
//! - Postcard codec for snapshot export
//! - Input validation and configuration

pub mod codec;
pub mod config;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use codec::{CodecError, decode, encode};
pub use error::{ErrorCode, LedgerError, Result};
pub use types::*;
