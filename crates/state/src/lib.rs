//! Registries and ledger context for the mortgage ledger.
//!
//! This crate holds all mutable ledger state, providing:
//!
//! - Authorization gate with a fixed owner and a growing verifier set
//! - Property registry (register, overwriting any existing record; verify once)
//! - Payment registry with per-investor allocations and claims
//! - Default registry with recovery actions
//! - Command dispatch over an explicit ledger context
//! - Lock-serialized shared handle
//! - Versioned snapshots for export and restore

#![deny(unsafe_code)]

mod access;
mod defaults;
mod ledger;
mod payment;
mod property;
mod shared;
mod snapshot;

pub use access::AccessControl;
pub use defaults::DefaultRegistry;
pub use ledger::MortgageLedger;
pub use payment::PaymentRegistry;
pub use property::PropertyRegistry;
pub use shared::SharedLedger;
pub use snapshot::{LedgerSnapshot, SNAPSHOT_VERSION, SnapshotError};
