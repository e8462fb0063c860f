//! Property registry.
//!
//! Properties are registered by the owner and verified exactly once by a
//! verifier. Re-registering a key overwrites the previous record, including a
//! verified one.

use std::collections::BTreeMap;

use mortgage_ledger_types::{
    Amount, LedgerError, Principal, PropertyId, PropertyRecord, PropertyStatus, Role, Timestamp,
    error::{AlreadyVerifiedSnafu, PropertyNotFoundSnafu},
    validation::{ValidationConfig, validate_identifier, validate_text},
};
use snafu::{OptionExt, ensure};
use tracing::info;

use crate::access::AccessControl;

/// Keyed store of property records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyRegistry {
    properties: BTreeMap<PropertyId, PropertyRecord>,
    limits: ValidationConfig,
}

impl PropertyRegistry {
    /// Creates an empty registry enforcing `limits` on new records.
    pub fn new(limits: ValidationConfig) -> Self {
        Self { properties: BTreeMap::new(), limits }
    }

    pub(crate) fn from_records(
        limits: ValidationConfig,
        properties: BTreeMap<PropertyId, PropertyRecord>,
    ) -> Self {
        Self { properties, limits }
    }

    /// Registers a property in the pending state.
    ///
    /// Any existing record under `property_id` is replaced.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::InvalidArgument`] if the id or address violates the limits.
    pub fn register(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        property_id: PropertyId,
        address: String,
        valuation: Amount,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        validate_identifier("property_id", property_id.as_str(), &self.limits)?;
        validate_text("address", &address, &self.limits)?;

        let replaced = self
            .properties
            .insert(property_id.clone(), PropertyRecord::pending(caller.clone(), address, valuation))
            .is_some();
        info!(property_id = %property_id, valuation, replaced, "Property registered");
        Ok(())
    }

    /// Verifies a pending property, recording the inspection and new valuation.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not a verifier.
    /// - [`LedgerError::PropertyNotFound`] if no record exists.
    /// - [`LedgerError::AlreadyVerified`] if the record is already verified.
    pub fn verify(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        property_id: &PropertyId,
        inspection_date: Timestamp,
        valuation: Amount,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Verifier)?;
        let record = self
            .properties
            .get_mut(property_id)
            .context(PropertyNotFoundSnafu { property_id: property_id.clone() })?;
        ensure!(!record.is_verified(), AlreadyVerifiedSnafu { property_id: property_id.clone() });

        record.status = PropertyStatus::Verified;
        record.last_inspection_date = inspection_date;
        record.valuation = valuation;
        info!(property_id = %property_id, verifier = %caller, inspection_date, valuation, "Property verified");
        Ok(())
    }

    /// Returns the record for `property_id`, if any.
    pub fn get(&self, property_id: &str) -> Option<&PropertyRecord> {
        self.properties.get(property_id)
    }

    /// Returns all records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyId, &PropertyRecord)> {
        self.properties.iter()
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no property has been registered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use mortgage_ledger_types::ErrorCode;

    use super::*;

    fn setup() -> (AccessControl, PropertyRegistry, Principal, Principal) {
        let owner = Principal::new("owner");
        let verifier = Principal::new("inspector");
        let gate = AccessControl::with_verifiers(owner.clone(), [verifier.clone()]);
        (gate, PropertyRegistry::default(), owner, verifier)
    }

    fn register(registry: &mut PropertyRegistry, gate: &AccessControl, owner: &Principal) {
        registry
            .register(gate, owner, PropertyId::new("prop123"), "123 Main St".into(), 1_000_000)
            .expect("owner registers");
    }

    #[test]
    fn test_register_creates_pending_record() {
        let (gate, mut registry, owner, _) = setup();
        register(&mut registry, &gate, &owner);

        let record = registry.get("prop123").expect("record exists");
        assert_eq!(record.owner, owner);
        assert_eq!(record.address, "123 Main St");
        assert!(!record.is_verified());
        assert_eq!(record.status, PropertyStatus::Pending);
        assert_eq!(record.last_inspection_date, 0);
    }

    #[test]
    fn test_register_requires_owner() {
        let (gate, mut registry, _, verifier) = setup();
        let err = registry
            .register(&gate, &verifier, PropertyId::new("prop123"), "123 Main St".into(), 1)
            .unwrap_err();
        assert_eq!(err.abort_code(), Some(100));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_overwrites_verified_record() {
        let (gate, mut registry, owner, verifier) = setup();
        register(&mut registry, &gate, &owner);
        let id = PropertyId::new("prop123");
        registry.verify(&gate, &verifier, &id, 1_625_097_600, 1_200_000).unwrap();

        registry.register(&gate, &owner, id.clone(), "9 Elm St".into(), 5).unwrap();
        let record = registry.get("prop123").unwrap();
        assert_eq!(record.address, "9 Elm St");
        assert!(!record.is_verified());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_empty_id_after_auth() {
        let (gate, mut registry, owner, verifier) = setup();
        // Authorization is checked before arguments.
        let err = registry.register(&gate, &verifier, PropertyId::new(""), String::new(), 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthorized);

        let err = registry.register(&gate, &owner, PropertyId::new(""), String::new(), 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_verify_sets_all_fields() {
        let (gate, mut registry, owner, verifier) = setup();
        register(&mut registry, &gate, &owner);

        registry
            .verify(&gate, &verifier, &PropertyId::new("prop123"), 1_625_097_600, 1_200_000)
            .expect("verifier verifies");
        let record = registry.get("prop123").unwrap();
        assert!(record.is_verified());
        assert_eq!(record.status, PropertyStatus::Verified);
        assert_eq!(record.valuation, 1_200_000);
        assert_eq!(record.last_inspection_date, 1_625_097_600);
        assert_eq!(record.owner, owner);
    }

    #[test]
    fn test_verify_twice_keeps_first_values() {
        let (gate, mut registry, owner, verifier) = setup();
        register(&mut registry, &gate, &owner);
        let id = PropertyId::new("prop123");
        registry.verify(&gate, &verifier, &id, 1_625_097_600, 1_200_000).unwrap();

        let err = registry.verify(&gate, &verifier, &id, 1_700_000_000, 9).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyVerified { .. }));
        let record = registry.get("prop123").unwrap();
        assert_eq!(record.valuation, 1_200_000);
        assert_eq!(record.last_inspection_date, 1_625_097_600);
    }

    #[test]
    fn test_verify_unknown_property() {
        let (gate, mut registry, _, verifier) = setup();
        let err = registry.verify(&gate, &verifier, &PropertyId::new("nope"), 1, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PropertyNotFound);
        assert_eq!(err.abort_code(), Some(102));
    }

    #[test]
    fn test_verify_requires_verifier_before_existence() {
        let (gate, mut registry, owner, _) = setup();
        // The owner is not a verifier, and the property does not exist:
        // the role check wins.
        let err = registry.verify(&gate, &owner, &PropertyId::new("nope"), 1, 1).unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized { required: Role::Verifier, .. }));
        assert_eq!(err.abort_code(), Some(103));
    }
}
