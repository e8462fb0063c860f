//! Shared test utilities for the mortgage ledger crates.
//!
//! - [`fixtures`] - Well-known principals and ready-made configurations
//! - [`strategies`] - Proptest generators for identifiers, records, and commands

#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::disallowed_methods))]

pub mod fixtures;
pub mod strategies;

pub use fixtures::{
    NON_VERIFIER, OTHER, OWNER, VERIFIER, non_verifier, other, owner, test_ledger_config, verifier,
};
