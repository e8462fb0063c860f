//! The mortgage ledger context.
//!
//! [`MortgageLedger`] owns the authorization gate and the three registries.
//! Every mutating operation is available both as a method and as a
//! [`LedgerCommand`] routed through [`MortgageLedger::apply`]. A rejected
//! operation leaves every store untouched.

use mortgage_ledger_types::{
    ActionId, ActionType, Amount, DefaultRecord, DistributionRecord, LedgerCommand, LedgerError,
    LoanId, PaymentId, PaymentRecord, PaymentType, Principal, PropertyId, PropertyRecord,
    RecoveryActionRecord, Timestamp, config::LedgerConfig, error::ConfigSnafu,
    validation::ValidationConfig,
};
use snafu::ensure;
use tracing::{debug, instrument};

use crate::{
    access::AccessControl,
    defaults::DefaultRegistry,
    payment::PaymentRegistry,
    property::PropertyRegistry,
    snapshot::{LedgerSnapshot, SNAPSHOT_VERSION},
};

/// Owner, verifier set, and all record stores of one ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MortgageLedger {
    access: AccessControl,
    properties: PropertyRegistry,
    payments: PaymentRegistry,
    defaults: DefaultRegistry,
    limits: ValidationConfig,
}

/// Logs a rejected operation and passes the result through.
fn logged<T>(
    operation: &'static str,
    caller: &Principal,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    if let Err(err) = &result {
        debug!(operation, caller = %caller, code = %err.code(), error = %err, "Operation rejected");
    }
    result
}

impl MortgageLedger {
    /// Creates an empty ledger owned by `owner`, with no verifiers and
    /// default validation limits.
    pub fn new(owner: Principal) -> Self {
        Self::with_parts(AccessControl::new(owner), ValidationConfig::default())
    }

    /// Creates an empty ledger from validated configuration.
    ///
    /// Configured verifiers are granted the role directly; initialization is
    /// not an operation and involves no caller.
    pub fn from_config(config: &LedgerConfig) -> Self {
        let access =
            AccessControl::with_verifiers(config.owner.clone(), config.verifiers.iter().cloned());
        Self::with_parts(access, config.validation)
    }

    fn with_parts(access: AccessControl, limits: ValidationConfig) -> Self {
        Self {
            access,
            properties: PropertyRegistry::new(limits),
            payments: PaymentRegistry::new(limits),
            defaults: DefaultRegistry::new(limits),
            limits,
        }
    }

    /// Dispatches a command on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation. No state changes on error.
    #[instrument(skip_all, fields(operation = command.name(), caller = %caller))]
    pub fn apply(&mut self, caller: &Principal, command: LedgerCommand) -> Result<(), LedgerError> {
        match command {
            LedgerCommand::AddVerifier { verifier } => self.add_verifier(caller, verifier),
            LedgerCommand::RegisterProperty { property_id, address, valuation } => {
                self.register_property(caller, property_id, address, valuation)
            },
            LedgerCommand::VerifyProperty { property_id, inspection_date, valuation } => {
                self.verify_property(caller, &property_id, inspection_date, valuation)
            },
            LedgerCommand::RecordPayment { payment_id, loan_id, amount, payment_date, payment_type } => {
                self.record_payment(caller, payment_id, loan_id, amount, payment_date, payment_type)
            },
            LedgerCommand::DistributePayment { payment_id } => {
                self.distribute_payment(caller, &payment_id)
            },
            LedgerCommand::AllocateToInvestor { payment_id, investor, amount } => {
                self.allocate_to_investor(caller, payment_id, investor, amount)
            },
            LedgerCommand::ClaimDistribution { payment_id } => {
                self.claim_distribution(caller, &payment_id)
            },
            LedgerCommand::DeclareDefault {
                loan_id,
                default_date,
                days_past_due,
                outstanding_principal,
                outstanding_interest,
            } => self.declare_default(
                caller,
                loan_id,
                default_date,
                days_past_due,
                outstanding_principal,
                outstanding_interest,
            ),
            LedgerCommand::CreateRecoveryAction {
                action_id,
                loan_id,
                action_type,
                action_date,
                description,
            } => self.create_recovery_action(
                caller,
                action_id,
                loan_id,
                action_type,
                action_date,
                description,
            ),
            LedgerCommand::CompleteRecoveryAction { action_id } => {
                self.complete_recovery_action(caller, &action_id)
            },
            LedgerCommand::ResolveDefault { loan_id, resolution_date } => {
                self.resolve_default(caller, &loan_id, resolution_date)
            },
        }
    }

    // ========================================================================
    // Principals and roles
    // ========================================================================

    /// Grants the verifier role. Owner only; re-adding succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    pub fn add_verifier(&mut self, caller: &Principal, verifier: Principal) -> Result<(), LedgerError> {
        logged("add_verifier", caller, self.access.add_verifier(caller, verifier))
    }

    /// Returns the owner principal.
    pub fn owner(&self) -> &Principal {
        self.access.owner()
    }

    /// Whether `principal` is the owner.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        self.access.is_owner(principal)
    }

    /// Whether `principal` holds the verifier role.
    pub fn is_verifier(&self, principal: &Principal) -> bool {
        self.access.is_verifier(principal)
    }

    /// Returns the verifier set in principal order.
    pub fn verifiers(&self) -> impl Iterator<Item = &Principal> {
        self.access.verifiers()
    }

    /// Returns the authorization gate.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// See [`PropertyRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` or `InvalidArgument`.
    pub fn register_property(
        &mut self,
        caller: &Principal,
        property_id: PropertyId,
        address: String,
        valuation: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.properties.register(&self.access, caller, property_id, address, valuation);
        logged("register_property", caller, result)
    }

    /// See [`PropertyRegistry::verify`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized`, `PropertyNotFound`, or `AlreadyVerified`.
    pub fn verify_property(
        &mut self,
        caller: &Principal,
        property_id: &PropertyId,
        inspection_date: Timestamp,
        valuation: Amount,
    ) -> Result<(), LedgerError> {
        let result =
            self.properties.verify(&self.access, caller, property_id, inspection_date, valuation);
        logged("verify_property", caller, result)
    }

    /// Returns the property record, if any.
    pub fn get_property(&self, property_id: &str) -> Option<&PropertyRecord> {
        self.properties.get(property_id)
    }

    /// Returns the property registry.
    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    // ========================================================================
    // Payments
    // ========================================================================

    /// See [`PaymentRegistry::record`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` or `InvalidArgument`.
    pub fn record_payment(
        &mut self,
        caller: &Principal,
        payment_id: PaymentId,
        loan_id: LoanId,
        amount: Amount,
        payment_date: Timestamp,
        payment_type: PaymentType,
    ) -> Result<(), LedgerError> {
        let result = self.payments.record(
            &self.access,
            caller,
            payment_id,
            loan_id,
            amount,
            payment_date,
            payment_type,
        );
        logged("record_payment", caller, result)
    }

    /// See [`PaymentRegistry::distribute`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized`, `PaymentNotFound`, or `AlreadyDistributed`.
    pub fn distribute_payment(
        &mut self,
        caller: &Principal,
        payment_id: &PaymentId,
    ) -> Result<(), LedgerError> {
        let result = self.payments.distribute(&self.access, caller, payment_id);
        logged("distribute_payment", caller, result)
    }

    /// See [`PaymentRegistry::allocate`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` or `InvalidArgument`.
    pub fn allocate_to_investor(
        &mut self,
        caller: &Principal,
        payment_id: PaymentId,
        investor: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.payments.allocate(&self.access, caller, payment_id, investor, amount);
        logged("allocate_to_investor", caller, result)
    }

    /// See [`PaymentRegistry::claim`].
    ///
    /// # Errors
    ///
    /// Returns `DistributionNotFound` or `AlreadyClaimed`.
    pub fn claim_distribution(
        &mut self,
        caller: &Principal,
        payment_id: &PaymentId,
    ) -> Result<(), LedgerError> {
        logged("claim_distribution", caller, self.payments.claim(caller, payment_id))
    }

    /// Returns the payment record, if any.
    pub fn get_payment(&self, payment_id: &str) -> Option<&PaymentRecord> {
        self.payments.get_payment(payment_id)
    }

    /// Returns the allocation for `(payment_id, investor)`, if any.
    pub fn get_distribution(
        &self,
        payment_id: &PaymentId,
        investor: &Principal,
    ) -> Option<&DistributionRecord> {
        self.payments.get_distribution(payment_id, investor)
    }

    /// Returns every allocation of one payment, in investor order.
    pub fn distributions_for_payment<'a>(
        &'a self,
        payment_id: &'a PaymentId,
    ) -> impl Iterator<Item = (&'a Principal, &'a DistributionRecord)> + 'a {
        self.payments.distributions_for_payment(payment_id)
    }

    /// Returns the payment registry.
    pub fn payments(&self) -> &PaymentRegistry {
        &self.payments
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    /// See [`DefaultRegistry::declare`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized`, `InvalidArgument`, or `AlreadyDeclared`.
    pub fn declare_default(
        &mut self,
        caller: &Principal,
        loan_id: LoanId,
        default_date: Timestamp,
        days_past_due: u32,
        outstanding_principal: Amount,
        outstanding_interest: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.defaults.declare(
            &self.access,
            caller,
            loan_id,
            default_date,
            days_past_due,
            outstanding_principal,
            outstanding_interest,
        );
        logged("declare_default", caller, result)
    }

    /// See [`DefaultRegistry::create_action`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized`, `InvalidArgument`, or `DefaultNotFound`.
    pub fn create_recovery_action(
        &mut self,
        caller: &Principal,
        action_id: ActionId,
        loan_id: LoanId,
        action_type: ActionType,
        action_date: Timestamp,
        description: String,
    ) -> Result<(), LedgerError> {
        let result = self.defaults.create_action(
            &self.access,
            caller,
            action_id,
            loan_id,
            action_type,
            action_date,
            description,
        );
        logged("create_recovery_action", caller, result)
    }

    /// See [`DefaultRegistry::complete_action`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` or `ActionNotFound`.
    pub fn complete_recovery_action(
        &mut self,
        caller: &Principal,
        action_id: &ActionId,
    ) -> Result<(), LedgerError> {
        let result = self.defaults.complete_action(&self.access, caller, action_id);
        logged("complete_recovery_action", caller, result)
    }

    /// See [`DefaultRegistry::resolve`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` or `DefaultNotFound`.
    pub fn resolve_default(
        &mut self,
        caller: &Principal,
        loan_id: &LoanId,
        resolution_date: Timestamp,
    ) -> Result<(), LedgerError> {
        let result = self.defaults.resolve(&self.access, caller, loan_id, resolution_date);
        logged("resolve_default", caller, result)
    }

    /// Returns the default record, if any.
    pub fn get_default(&self, loan_id: &str) -> Option<&DefaultRecord> {
        self.defaults.get_default(loan_id)
    }

    /// Returns the recovery action, if any.
    pub fn get_recovery_action(&self, action_id: &str) -> Option<&RecoveryActionRecord> {
        self.defaults.get_recovery_action(action_id)
    }

    /// Returns every recovery action recorded against `loan_id`.
    pub fn recovery_actions_for_loan<'a>(
        &'a self,
        loan_id: &'a LoanId,
    ) -> impl Iterator<Item = (&'a ActionId, &'a RecoveryActionRecord)> + 'a {
        self.defaults.recovery_actions_for_loan(loan_id)
    }

    /// Returns the default registry.
    pub fn defaults(&self) -> &DefaultRegistry {
        &self.defaults
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Captures the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            owner: self.access.owner().clone(),
            verifiers: self.access.verifiers().cloned().collect(),
            validation: self.limits,
            properties: self.properties.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            payments: self.payments.payments().map(|(k, v)| (k.clone(), v.clone())).collect(),
            distributions: self.payments.distributions().map(|(k, v)| (k.clone(), *v)).collect(),
            defaults: self.defaults.defaults().map(|(k, v)| (k.clone(), v.clone())).collect(),
            recovery_actions: self.defaults.actions().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Rebuilds a ledger from a snapshot.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Serialization`] if the snapshot version is unsupported.
    /// - [`LedgerError::Config`] if the owner is empty or a validation limit is zero.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        snapshot.check_version()?;
        snapshot.validation.validate()?;
        ensure!(
            !snapshot.owner.as_str().is_empty(),
            ConfigSnafu { message: "owner must not be empty" }
        );
        let LedgerSnapshot {
            version: _,
            owner,
            verifiers,
            validation,
            properties,
            payments,
            distributions,
            defaults,
            recovery_actions,
        } = snapshot;

        Ok(Self {
            access: AccessControl::with_verifiers(owner, verifiers),
            properties: PropertyRegistry::from_records(validation, properties),
            payments: PaymentRegistry::from_records(validation, payments, distributions),
            defaults: DefaultRegistry::from_records(validation, defaults, recovery_actions),
            limits: validation,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use mortgage_ledger_types::{ErrorCode, Role};

    use super::*;

    fn owner() -> Principal {
        Principal::new("owner")
    }

    fn inspector() -> Principal {
        Principal::new("inspector")
    }

    fn ledger() -> MortgageLedger {
        let config = LedgerConfig::builder()
            .owner(owner())
            .verifiers(vec![inspector()])
            .build()
            .expect("valid config");
        MortgageLedger::from_config(&config)
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = MortgageLedger::new(owner());
        assert_eq!(ledger.owner(), &owner());
        assert_eq!(ledger.verifiers().count(), 0);
        assert!(ledger.properties().is_empty());
        assert_eq!(ledger.payments().payments().count(), 0);
        assert_eq!(ledger.defaults().defaults().count(), 0);
    }

    #[test]
    fn test_from_config_seeds_verifiers() {
        let ledger = ledger();
        assert!(ledger.is_verifier(&inspector()));
        assert!(!ledger.is_verifier(&owner()));
        assert!(ledger.is_owner(&owner()));
    }

    #[test]
    fn test_from_config_applies_limits() {
        let config = LedgerConfig::builder()
            .owner(owner())
            .validation(ValidationConfig::builder().max_identifier_bytes(4).build().unwrap())
            .build()
            .unwrap();
        let mut ledger = MortgageLedger::from_config(&config);
        let err = ledger
            .register_property(&owner(), PropertyId::new("prop123"), String::new(), 1)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(ledger.register_property(&owner(), PropertyId::new("p1"), String::new(), 1).is_ok());
    }

    #[test]
    fn test_apply_routes_each_command() {
        let mut ledger = ledger();
        let commands = [
            LedgerCommand::AddVerifier { verifier: Principal::new("second") },
            LedgerCommand::RegisterProperty {
                property_id: "prop123".into(),
                address: "123 Main St".into(),
                valuation: 1_000_000,
            },
            LedgerCommand::RecordPayment {
                payment_id: "payment123".into(),
                loan_id: "loan123".into(),
                amount: 50_000,
                payment_date: 1_625_097_600,
                payment_type: PaymentType::Interest,
            },
            LedgerCommand::DistributePayment { payment_id: "payment123".into() },
            LedgerCommand::AllocateToInvestor {
                payment_id: "payment123".into(),
                investor: "investor".into(),
                amount: 20_000,
            },
            LedgerCommand::DeclareDefault {
                loan_id: "loan123".into(),
                default_date: 1_625_097_600,
                days_past_due: 90,
                outstanding_principal: 200_000,
                outstanding_interest: 5_000,
            },
            LedgerCommand::CreateRecoveryAction {
                action_id: "action123".into(),
                loan_id: "loan123".into(),
                action_type: ActionType::Notice,
                action_date: 1_625_184_000,
                description: "Notice of default sent to borrower".into(),
            },
            LedgerCommand::CompleteRecoveryAction { action_id: "action123".into() },
            LedgerCommand::ResolveDefault { loan_id: "loan123".into(), resolution_date: 1_627_776_000 },
        ];
        for command in commands {
            let name = command.name();
            let result = ledger.apply(&owner(), command);
            assert!(result.is_ok(), "{name} failed: {result:?}");
        }

        ledger
            .apply(
                &inspector(),
                LedgerCommand::VerifyProperty {
                    property_id: "prop123".into(),
                    inspection_date: 1_625_097_600,
                    valuation: 1_200_000,
                },
            )
            .unwrap();
        ledger
            .apply(&Principal::new("investor"), LedgerCommand::ClaimDistribution {
                payment_id: "payment123".into(),
            })
            .unwrap();

        assert!(ledger.is_verifier(&Principal::new("second")));
        assert!(ledger.get_property("prop123").unwrap().is_verified());
        assert!(ledger.get_payment("payment123").unwrap().distributed);
        assert!(
            ledger
                .get_distribution(&"payment123".into(), &"investor".into())
                .unwrap()
                .claimed
        );
        assert!(ledger.get_recovery_action("action123").unwrap().completed);
        assert_eq!(ledger.get_default("loan123").unwrap().resolution_date(), Some(1_627_776_000));
    }

    #[test]
    fn test_apply_reports_required_role() {
        let mut ledger = ledger();
        let command = LedgerCommand::DistributePayment { payment_id: "payment123".into() };
        let required = command.required_role();
        let err = ledger.apply(&inspector(), command).unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized { required: r, .. } if Some(r) == required));
        assert_eq!(required, Some(Role::Owner));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut ledger = ledger();
        ledger.register_property(&owner(), "prop123".into(), "123 Main St".into(), 1).unwrap();
        ledger.allocate_to_investor(&owner(), "p".into(), "investor".into(), 3).unwrap();
        ledger.declare_default(&owner(), "loan123".into(), 1, 90, 2, 3).unwrap();

        let restored = MortgageLedger::restore(ledger.snapshot()).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_restore_through_bytes() {
        let mut ledger = ledger();
        ledger.record_payment(&owner(), "pay".into(), "loan".into(), 5, 6, "escrow".into()).unwrap();

        let bytes = ledger.snapshot().encode().unwrap();
        let restored = MortgageLedger::restore(LedgerSnapshot::decode(&bytes).unwrap()).unwrap();
        assert_eq!(restored.get_payment("pay").unwrap().payment_type, PaymentType::Escrow);
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let mut snapshot = ledger().snapshot();
        snapshot.version = 0;
        let err = MortgageLedger::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Serialization);
    }

    #[test]
    fn test_restore_rejects_zero_limits() {
        let mut snapshot = ledger().snapshot();
        snapshot.validation.max_identifier_bytes = 0;
        let err = MortgageLedger::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);

        let mut snapshot = ledger().snapshot();
        snapshot.validation.max_text_bytes = 0;
        let err = MortgageLedger::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
    }

    #[test]
    fn test_restore_rejects_empty_owner() {
        let mut snapshot = ledger().snapshot();
        snapshot.owner = Principal::new("");
        let err = MortgageLedger::restore(snapshot).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
        assert!(err.to_string().contains("owner must not be empty"));
    }

    #[test]
    fn test_restore_spelled_out_tags_yields_equal_ledger() {
        let mut ledger = ledger();
        ledger
            .record_payment(
                &owner(),
                "payment123".into(),
                "loan123".into(),
                50_000,
                1_625_097_600,
                PaymentType::Other("interest".to_string()),
            )
            .unwrap();
        ledger.declare_default(&owner(), "loan123".into(), 1, 90, 2, 3).unwrap();
        ledger
            .create_recovery_action(
                &owner(),
                "action123".into(),
                "loan123".into(),
                ActionType::Other("foreclosure".to_string()),
                1,
                String::new(),
            )
            .unwrap();

        let bytes = ledger.snapshot().encode().unwrap();
        let restored = MortgageLedger::restore(LedgerSnapshot::decode(&bytes).unwrap()).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.get_payment("payment123").unwrap().payment_type, PaymentType::Interest);
        assert_eq!(
            restored.get_recovery_action("action123").unwrap().action_type,
            ActionType::Foreclosure
        );
    }
}
