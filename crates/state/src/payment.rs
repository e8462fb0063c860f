//! Payment registry and per-investor distributions.
//!
//! Payments and allocations are independent stores. An allocation references
//! its payment only by identifier: it may be created before, after, or
//! without the payment being recorded, and before or after the payment is
//! marked distributed. Allocation amounts are not reconciled against the
//! payment amount.

use std::collections::BTreeMap;

use mortgage_ledger_types::{
    Amount, DistributionKey, DistributionRecord, LedgerError, LoanId, PaymentId, PaymentRecord,
    PaymentType, Principal, Role, Timestamp,
    error::{
        AlreadyClaimedSnafu, AlreadyDistributedSnafu, DistributionNotFoundSnafu,
        PaymentNotFoundSnafu,
    },
    validation::{ValidationConfig, validate_identifier, validate_text},
};
use snafu::{OptionExt, ensure};
use tracing::info;

use crate::access::AccessControl;

/// Keyed store of payments plus the derived store of investor allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRegistry {
    payments: BTreeMap<PaymentId, PaymentRecord>,
    distributions: BTreeMap<DistributionKey, DistributionRecord>,
    limits: ValidationConfig,
}

impl PaymentRegistry {
    /// Creates an empty registry enforcing `limits` on new records.
    pub fn new(limits: ValidationConfig) -> Self {
        Self { payments: BTreeMap::new(), distributions: BTreeMap::new(), limits }
    }

    pub(crate) fn from_records(
        limits: ValidationConfig,
        payments: BTreeMap<PaymentId, PaymentRecord>,
        distributions: BTreeMap<DistributionKey, DistributionRecord>,
    ) -> Self {
        Self { payments, distributions, limits }
    }

    /// Records a payment as not yet distributed.
    ///
    /// Any existing record under `payment_id` is replaced.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::InvalidArgument`] if an id or the type tag violates the limits.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        payment_id: PaymentId,
        loan_id: LoanId,
        amount: Amount,
        payment_date: Timestamp,
        payment_type: PaymentType,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        validate_identifier("payment_id", payment_id.as_str(), &self.limits)?;
        validate_identifier("loan_id", loan_id.as_str(), &self.limits)?;
        validate_text("payment_type", payment_type.as_str(), &self.limits)?;

        let payment_type = payment_type.normalized();
        let replaced = self
            .payments
            .insert(
                payment_id.clone(),
                PaymentRecord {
                    loan_id: loan_id.clone(),
                    amount,
                    payment_date,
                    payment_type: payment_type.clone(),
                    distributed: false,
                },
            )
            .is_some();
        info!(
            payment_id = %payment_id,
            loan_id = %loan_id,
            amount,
            payment_type = %payment_type,
            replaced,
            "Payment recorded"
        );
        Ok(())
    }

    /// Marks a payment distributed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::PaymentNotFound`] if no record exists.
    /// - [`LedgerError::AlreadyDistributed`] if the payment was already distributed.
    pub fn distribute(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        payment_id: &PaymentId,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        let payment = self
            .payments
            .get_mut(payment_id)
            .context(PaymentNotFoundSnafu { payment_id: payment_id.clone() })?;
        ensure!(!payment.distributed, AlreadyDistributedSnafu { payment_id: payment_id.clone() });

        payment.distributed = true;
        info!(payment_id = %payment_id, "Payment distributed");
        Ok(())
    }

    /// Allocates `amount` of a payment to `investor`, unclaimed.
    ///
    /// Upserts: an existing allocation for the same pair is replaced and its
    /// claim flag reset. The payment need not exist.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::InvalidArgument`] if `payment_id` violates the limits.
    pub fn allocate(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        payment_id: PaymentId,
        investor: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        validate_identifier("payment_id", payment_id.as_str(), &self.limits)?;

        let key = DistributionKey { payment_id, investor };
        info!(payment_id = %key.payment_id, investor = %key.investor, amount, "Allocated to investor");
        self.distributions.insert(key, DistributionRecord { amount, claimed: false });
        Ok(())
    }

    /// Claims the caller's own allocation of a payment.
    ///
    /// There is no role check: the caller is the investor half of the key, so
    /// only the allocated investor can reach the record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DistributionNotFound`] if the caller has no allocation.
    /// - [`LedgerError::AlreadyClaimed`] if the allocation was already claimed.
    pub fn claim(&mut self, caller: &Principal, payment_id: &PaymentId) -> Result<(), LedgerError> {
        let key = DistributionKey { payment_id: payment_id.clone(), investor: caller.clone() };
        let distribution = self.distributions.get_mut(&key).context(DistributionNotFoundSnafu {
            payment_id: payment_id.clone(),
            investor: caller.clone(),
        })?;
        ensure!(
            !distribution.claimed,
            AlreadyClaimedSnafu { payment_id: payment_id.clone(), investor: caller.clone() }
        );

        distribution.claimed = true;
        info!(payment_id = %payment_id, investor = %caller, amount = distribution.amount, "Distribution claimed");
        Ok(())
    }

    /// Returns the payment record, if any.
    pub fn get_payment(&self, payment_id: &str) -> Option<&PaymentRecord> {
        self.payments.get(payment_id)
    }

    /// Returns the allocation for `(payment_id, investor)`, if any.
    pub fn get_distribution(
        &self,
        payment_id: &PaymentId,
        investor: &Principal,
    ) -> Option<&DistributionRecord> {
        // Lookup needs an owned key; composite keys have no borrowed form.
        let key = DistributionKey { payment_id: payment_id.clone(), investor: investor.clone() };
        self.distributions.get(&key)
    }

    /// Returns every allocation of one payment, in investor order.
    pub fn distributions_for_payment<'a>(
        &'a self,
        payment_id: &'a PaymentId,
    ) -> impl Iterator<Item = (&'a Principal, &'a DistributionRecord)> + 'a {
        let start = DistributionKey { payment_id: payment_id.clone(), investor: Principal::new("") };
        self.distributions
            .range(start..)
            .take_while(move |(key, _)| &key.payment_id == payment_id)
            .map(|(key, record)| (&key.investor, record))
    }

    /// Returns all payments in key order.
    pub fn payments(&self) -> impl Iterator<Item = (&PaymentId, &PaymentRecord)> {
        self.payments.iter()
    }

    /// Returns all allocations in key order.
    pub fn distributions(&self) -> impl Iterator<Item = (&DistributionKey, &DistributionRecord)> {
        self.distributions.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use mortgage_ledger_types::ErrorCode;

    use super::*;

    fn setup() -> (AccessControl, PaymentRegistry, Principal) {
        let owner = Principal::new("owner");
        (AccessControl::new(owner.clone()), PaymentRegistry::default(), owner)
    }

    fn record(registry: &mut PaymentRegistry, gate: &AccessControl, owner: &Principal) {
        registry
            .record(
                gate,
                owner,
                PaymentId::new("payment123"),
                LoanId::new("loan123"),
                50_000,
                1_625_097_600,
                PaymentType::Interest,
            )
            .expect("owner records payment");
    }

    #[test]
    fn test_record_payment() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);

        let payment = registry.get_payment("payment123").expect("payment exists");
        assert_eq!(payment.amount, 50_000);
        assert_eq!(payment.payment_type, PaymentType::Interest);
        assert_eq!(payment.loan_id, LoanId::new("loan123"));
        assert!(!payment.distributed);
    }

    #[test]
    fn test_record_payment_requires_owner() {
        let (gate, mut registry, _) = setup();
        let err = registry
            .record(
                &gate,
                &Principal::new("stranger"),
                PaymentId::new("payment123"),
                LoanId::new("loan123"),
                50_000,
                1_625_097_600,
                PaymentType::Interest,
            )
            .unwrap_err();
        assert_eq!(err.abort_code(), Some(100));
        assert_eq!(registry.payments().count(), 0);
    }

    #[test]
    fn test_rerecord_resets_distributed_flag() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        registry.distribute(&gate, &owner, &PaymentId::new("payment123")).unwrap();
        record(&mut registry, &gate, &owner);
        assert!(!registry.get_payment("payment123").unwrap().distributed);
    }

    #[test]
    fn test_rerecord_replaces_payment() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        registry
            .record(
                &gate,
                &owner,
                PaymentId::new("payment123"),
                LoanId::new("loan456"),
                75_000,
                1_625_184_000,
                PaymentType::Escrow,
            )
            .expect("owner re-records payment");

        assert_eq!(registry.payments().count(), 1);
        let payment = registry.get_payment("payment123").unwrap();
        assert_eq!(payment.amount, 75_000);
        assert_eq!(payment.loan_id, LoanId::new("loan456"));
        assert_eq!(payment.payment_type, PaymentType::Escrow);
    }

    #[test]
    fn test_spelled_out_known_payment_type_is_stored_as_variant() {
        let (gate, mut registry, owner) = setup();
        registry
            .record(
                &gate,
                &owner,
                PaymentId::new("payment123"),
                LoanId::new("loan123"),
                50_000,
                1_625_097_600,
                PaymentType::Other("interest".to_string()),
            )
            .unwrap();
        assert_eq!(registry.get_payment("payment123").unwrap().payment_type, PaymentType::Interest);
    }

    #[test]
    fn test_distribute_once() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        let id = PaymentId::new("payment123");

        registry.distribute(&gate, &owner, &id).expect("first distribution");
        assert!(registry.get_payment("payment123").unwrap().distributed);

        let err = registry.distribute(&gate, &owner, &id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyDistributed);
        assert_eq!(err.abort_code(), Some(102));
    }

    #[test]
    fn test_distribute_unknown_payment() {
        let (gate, mut registry, owner) = setup();
        let err = registry.distribute(&gate, &owner, &PaymentId::new("ghost")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PaymentNotFound);
        assert_eq!(err.abort_code(), Some(101));
    }

    #[test]
    fn test_allocate_without_payment() {
        let (gate, mut registry, owner) = setup();
        let investor = Principal::new("investor");
        registry.allocate(&gate, &owner, PaymentId::new("never-recorded"), investor.clone(), 10).unwrap();

        let allocation = registry.get_distribution(&PaymentId::new("never-recorded"), &investor).unwrap();
        assert_eq!(allocation.amount, 10);
        assert!(registry.get_payment("never-recorded").is_none());
    }

    #[test]
    fn test_allocate_after_distribution_is_allowed() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        let id = PaymentId::new("payment123");
        registry.distribute(&gate, &owner, &id).unwrap();
        assert!(registry.allocate(&gate, &owner, id, Principal::new("investor"), 5).is_ok());
    }

    #[test]
    fn test_reallocation_overwrites_and_resets_claim() {
        let (gate, mut registry, owner) = setup();
        let id = PaymentId::new("payment123");
        let investor = Principal::new("investor");
        registry.allocate(&gate, &owner, id.clone(), investor.clone(), 20_000).unwrap();
        registry.claim(&investor, &id).unwrap();

        registry.allocate(&gate, &owner, id.clone(), investor.clone(), 7).unwrap();
        let allocation = registry.get_distribution(&id, &investor).unwrap();
        assert_eq!(allocation, &DistributionRecord { amount: 7, claimed: false });
    }

    #[test]
    fn test_allocations_are_not_reconciled_with_payment_amount() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        let id = PaymentId::new("payment123");
        registry.allocate(&gate, &owner, id.clone(), Principal::new("a"), 40_000).unwrap();
        registry.allocate(&gate, &owner, id.clone(), Principal::new("b"), 40_000).unwrap();

        let total: Amount = registry.distributions_for_payment(&id).map(|(_, d)| d.amount).sum();
        assert_eq!(total, 80_000);
    }

    #[test]
    fn test_claim_is_scoped_to_caller() {
        let (gate, mut registry, owner) = setup();
        let id = PaymentId::new("payment123");
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        registry.allocate(&gate, &owner, id.clone(), alice.clone(), 20_000).unwrap();

        let err = registry.claim(&bob, &id).unwrap_err();
        assert!(matches!(err, LedgerError::DistributionNotFound { ref investor, .. } if investor == &bob));
        assert_eq!(err.abort_code(), Some(103));
        assert!(!registry.get_distribution(&id, &alice).unwrap().claimed);
    }

    #[test]
    fn test_owner_cannot_claim_on_behalf_of_investor() {
        let (gate, mut registry, owner) = setup();
        let id = PaymentId::new("payment123");
        registry.allocate(&gate, &owner, id.clone(), Principal::new("alice"), 1).unwrap();
        assert_eq!(registry.claim(&owner, &id).unwrap_err().code(), ErrorCode::DistributionNotFound);
    }

    #[test]
    fn test_claim_once() {
        let (gate, mut registry, owner) = setup();
        let id = PaymentId::new("payment123");
        let investor = Principal::new("investor");
        registry.allocate(&gate, &owner, id.clone(), investor.clone(), 20_000).unwrap();

        registry.claim(&investor, &id).expect("first claim");
        assert!(registry.get_distribution(&id, &investor).unwrap().claimed);

        let err = registry.claim(&investor, &id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyClaimed);
        assert_eq!(err.abort_code(), Some(104));
    }

    #[test]
    fn test_claim_independent_of_distributed_flag() {
        let (gate, mut registry, owner) = setup();
        record(&mut registry, &gate, &owner);
        let id = PaymentId::new("payment123");
        let investor = Principal::new("investor");
        registry.allocate(&gate, &owner, id.clone(), investor.clone(), 1).unwrap();

        registry.claim(&investor, &id).expect("claim before distribution");
        assert!(!registry.get_payment("payment123").unwrap().distributed);
    }

    #[test]
    fn test_distributions_for_payment_range() {
        let (gate, mut registry, owner) = setup();
        let p1 = PaymentId::new("p1");
        let p2 = PaymentId::new("p2");
        registry.allocate(&gate, &owner, p1.clone(), Principal::new("zoe"), 1).unwrap();
        registry.allocate(&gate, &owner, p2.clone(), Principal::new("amy"), 2).unwrap();
        registry.allocate(&gate, &owner, p1.clone(), Principal::new("amy"), 3).unwrap();
        // Shares a prefix with p1 but is a different payment.
        registry.allocate(&gate, &owner, PaymentId::new("p1-x"), Principal::new("amy"), 4).unwrap();

        let for_p1: Vec<_> =
            registry.distributions_for_payment(&p1).map(|(inv, d)| (inv.as_str(), d.amount)).collect();
        assert_eq!(for_p1, [("amy", 3), ("zoe", 1)]);
        assert_eq!(registry.distributions_for_payment(&PaymentId::new("p0")).count(), 0);
    }
}
