//! Point-in-time ledger snapshots.
//!
//! A snapshot is the complete ledger state: owner, verifier set, validation
//! limits, and every record store. Persisting the bytes is left to the
//! embedding environment.
//!
//! Format: one version byte followed by the postcard encoding of the
//! remaining fields. The version is the first field of [`LedgerSnapshot`], so
//! postcard emits it as the leading byte and it can be checked before the
//! body is decoded.

use std::collections::BTreeMap;

use mortgage_ledger_types::{
    ActionId, CodecError, DefaultRecord, DistributionKey, DistributionRecord, LedgerError, LoanId,
    PaymentId, PaymentRecord, Principal, PropertyId, PropertyRecord, RecoveryActionRecord, decode,
    encode, validation::ValidationConfig,
};
use serde::{Deserialize, Serialize};
use snafu::{Location, ResultExt, Snafu, ensure};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Snapshot error types.
#[derive(Debug, Snafu)]
pub enum SnapshotError {
    /// No bytes to decode.
    #[snafu(display("Snapshot is empty"))]
    Empty,

    /// The snapshot format version is not supported.
    #[snafu(display("Unsupported snapshot version: {version}"))]
    UnsupportedVersion {
        /// The unsupported version number.
        version: u8,
    },

    /// Error encoding or decoding snapshot data.
    #[snafu(display("Codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
    },
}

impl From<SnapshotError> for LedgerError {
    #[track_caller]
    fn from(err: SnapshotError) -> Self {
        let loc = std::panic::Location::caller();
        LedgerError::Serialization {
            message: err.to_string(),
            location: Location::new(loc.file(), loc.line(), loc.column()),
        }
    }
}

/// Serializable copy of the full ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Format version. Always [`SNAPSHOT_VERSION`] for snapshots taken by this build.
    pub version: u8,
    /// The single owner principal.
    pub owner: Principal,
    /// Verifier set in principal order.
    pub verifiers: Vec<Principal>,
    /// Size limits applied to new records.
    pub validation: ValidationConfig,
    /// Property store.
    pub properties: BTreeMap<PropertyId, PropertyRecord>,
    /// Payment store.
    pub payments: BTreeMap<PaymentId, PaymentRecord>,
    /// Distribution store.
    pub distributions: BTreeMap<DistributionKey, DistributionRecord>,
    /// Default store.
    pub defaults: BTreeMap<LoanId, DefaultRecord>,
    /// Recovery action store.
    pub recovery_actions: BTreeMap<ActionId, RecoveryActionRecord>,
}

impl LedgerSnapshot {
    /// Serializes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Codec`] if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        encode(self).context(CodecSnafu)
    }

    /// Deserializes a snapshot, rejecting unknown format versions before
    /// decoding the body.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Empty`] if `bytes` is empty.
    /// - [`SnapshotError::UnsupportedVersion`] if the leading byte is not a
    ///   known version.
    /// - [`SnapshotError::Codec`] if the body is malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let Some(&version) = bytes.first() else {
            return EmptySnafu.fail();
        };
        ensure!(version == SNAPSHOT_VERSION, UnsupportedVersionSnafu { version });
        let snapshot: Self = decode(bytes).context(CodecSnafu)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Checks that the snapshot carries a supported version.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnsupportedVersion`] otherwise.
    pub fn check_version(&self) -> Result<(), SnapshotError> {
        ensure!(self.version == SNAPSHOT_VERSION, UnsupportedVersionSnafu { version: self.version });
        Ok(())
    }
}
