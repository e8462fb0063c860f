//! Thread-safe ledger handle.
//!
//! Operations are serialized: a mutation holds the write lock from its
//! authorization check to its last store write, so no other operation can
//! observe or interleave with a partial update. There are no transactions
//! spanning several operations.

use std::sync::Arc;

use mortgage_ledger_types::{LedgerCommand, LedgerError, Principal, config::LedgerConfig};
use parking_lot::RwLock;

use crate::{ledger::MortgageLedger, snapshot::LedgerSnapshot};

/// Cloneable handle to one ledger shared between threads.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<MortgageLedger>>,
}

impl SharedLedger {
    /// Wraps an existing ledger.
    pub fn new(ledger: MortgageLedger) -> Self {
        Self { inner: Arc::new(RwLock::new(ledger)) }
    }

    /// Creates an empty shared ledger from configuration.
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(MortgageLedger::from_config(config))
    }

    /// Applies one command under the write lock.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation.
    pub fn apply(&self, caller: &Principal, command: LedgerCommand) -> Result<(), LedgerError> {
        self.inner.write().apply(caller, command)
    }

    /// Runs a read-only closure under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&MortgageLedger) -> R) -> R {
        f(&self.inner.read())
    }

    /// Captures a consistent snapshot of the full ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().snapshot()
    }

    /// Replaces the ledger state with a restored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Serialization`] if the snapshot version is
    /// unsupported; the current state is kept.
    pub fn restore(&self, snapshot: LedgerSnapshot) -> Result<(), LedgerError> {
        let restored = MortgageLedger::restore(snapshot)?;
        *self.inner.write() = restored;
        Ok(())
    }
}
