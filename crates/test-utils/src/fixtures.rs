//! Test fixtures.
//!
//! Centralizes the principals used across test modules so scenarios read the
//! same everywhere.

use mortgage_ledger_types::{Principal, config::LedgerConfig};

/// Ledger owner.
pub const OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
/// A principal with no role, typically an investor.
pub const OTHER: &str = "ST2PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
/// Principal granted the verifier role by [`test_ledger_config`].
pub const VERIFIER: &str = "ST3PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
/// A principal that is never granted the verifier role.
pub const NON_VERIFIER: &str = "ST4PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

/// Returns [`OWNER`] as a principal.
#[must_use]
pub fn owner() -> Principal {
    Principal::new(OWNER)
}

/// Returns [`OTHER`] as a principal.
#[must_use]
pub fn other() -> Principal {
    Principal::new(OTHER)
}

/// Returns [`VERIFIER`] as a principal.
#[must_use]
pub fn verifier() -> Principal {
    Principal::new(VERIFIER)
}

/// Returns [`NON_VERIFIER`] as a principal.
#[must_use]
pub fn non_verifier() -> Principal {
    Principal::new(NON_VERIFIER)
}

/// Returns a configuration owned by [`OWNER`] with [`VERIFIER`] as the only
/// verifier and default validation limits.
#[must_use]
pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig {
        owner: owner(),
        verifiers: vec![verifier()],
        validation: Default::default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_principals_are_distinct() {
        let all = [owner(), other(), verifier(), non_verifier()];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_ledger_config_is_valid() {
        let config = test_ledger_config();
        config.validate().expect("fixture config validates");
        assert_eq!(config.owner, owner());
        assert_eq!(config.verifiers, vec![verifier()]);
    }
}
