//! Principal and role registry.
//!
//! Holds the single owner principal and the verifier set, and answers the
//! authorization checks every mutating operation performs before touching
//! state. The owner is fixed at construction; the verifier set only grows.

use std::collections::BTreeSet;

use mortgage_ledger_types::{LedgerError, Principal, Role, error::NotAuthorizedSnafu};
use snafu::ensure;
use tracing::{debug, info};

/// Authorization gate shared by all registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    owner: Principal,
    verifiers: BTreeSet<Principal>,
}

impl AccessControl {
    /// Creates a gate with the given owner and an empty verifier set.
    pub fn new(owner: Principal) -> Self {
        Self { owner, verifiers: BTreeSet::new() }
    }

    /// Creates a gate with a pre-populated verifier set.
    ///
    /// Used at initialization and restore, where no caller is involved.
    pub fn with_verifiers(owner: Principal, verifiers: impl IntoIterator<Item = Principal>) -> Self {
        Self { owner, verifiers: verifiers.into_iter().collect() }
    }

    /// Returns the owner principal.
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Returns the verifier set in principal order.
    pub fn verifiers(&self) -> impl Iterator<Item = &Principal> {
        self.verifiers.iter()
    }

    /// Whether `principal` is the owner.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// Whether `principal` is in the verifier set.
    pub fn is_verifier(&self, principal: &Principal) -> bool {
        self.verifiers.contains(principal)
    }

    /// Whether `principal` holds `role`.
    pub fn has_role(&self, principal: &Principal, role: Role) -> bool {
        match role {
            Role::Owner => self.is_owner(principal),
            Role::Verifier => self.is_verifier(principal),
        }
    }

    /// Checks that `caller` holds `role`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAuthorized`] naming the caller and the
    /// missing role.
    pub fn require(&self, caller: &Principal, role: Role) -> Result<(), LedgerError> {
        ensure!(
            self.has_role(caller, role),
            NotAuthorizedSnafu { caller: caller.clone(), required: role }
        );
        Ok(())
    }

    /// Adds `verifier` to the verifier set. Re-adding is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    pub fn add_verifier(&mut self, caller: &Principal, verifier: Principal) -> Result<(), LedgerError> {
        self.require(caller, Role::Owner)?;
        if self.verifiers.insert(verifier.clone()) {
            info!(verifier = %verifier, "Verifier added");
        } else {
            debug!(verifier = %verifier, "Verifier already present");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use mortgage_ledger_types::ErrorCode;

    use super::*;

    fn owner() -> Principal {
        Principal::new("owner")
    }

    #[test]
    fn test_owner_is_fixed() {
        let gate = AccessControl::new(owner());
        assert!(gate.is_owner(&owner()));
        assert!(!gate.is_owner(&Principal::new("someone")));
        assert_eq!(gate.owner(), &owner());
    }

    #[test]
    fn test_owner_is_not_implicitly_verifier() {
        let gate = AccessControl::new(owner());
        assert!(!gate.is_verifier(&owner()));
        let err = gate.require(&owner(), Role::Verifier).unwrap_err();
        assert_eq!(err.abort_code(), Some(103));
    }

    #[test]
    fn test_add_verifier_by_owner() {
        let mut gate = AccessControl::new(owner());
        let verifier = Principal::new("inspector");
        gate.add_verifier(&owner(), verifier.clone()).expect("owner may add");
        assert!(gate.is_verifier(&verifier));
        assert!(gate.require(&verifier, Role::Verifier).is_ok());
    }

    #[test]
    fn test_add_verifier_is_idempotent() {
        let mut gate = AccessControl::new(owner());
        let verifier = Principal::new("inspector");
        gate.add_verifier(&owner(), verifier.clone()).unwrap();
        gate.add_verifier(&owner(), verifier.clone()).expect("re-adding succeeds");
        assert_eq!(gate.verifiers().count(), 1);
    }

    #[test]
    fn test_add_verifier_by_non_owner_rejected() {
        let mut gate = AccessControl::new(owner());
        let intruder = Principal::new("intruder");
        let err = gate.add_verifier(&intruder, intruder.clone()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthorized);
        assert_eq!(err.abort_code(), Some(100));
        assert_eq!(gate.verifiers().count(), 0);
    }

    #[test]
    fn test_verifier_cannot_add_verifiers() {
        let mut gate =
            AccessControl::with_verifiers(owner(), [Principal::new("inspector")]);
        let result = gate.add_verifier(&Principal::new("inspector"), Principal::new("friend"));
        assert!(matches!(result, Err(LedgerError::NotAuthorized { required: Role::Owner, .. })));
        assert!(!gate.is_verifier(&Principal::new("friend")));
    }

    #[test]
    fn test_verifiers_iterate_in_order() {
        let gate = AccessControl::with_verifiers(
            owner(),
            [Principal::new("c"), Principal::new("a"), Principal::new("b")],
        );
        let names: Vec<_> = gate.verifiers().map(Principal::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
