//! Proptest strategies for mortgage ledger domain types.
//!
//! Identifier strategies draw from small pools so that generated command
//! sequences collide on keys and exercise the lifecycle guards (already
//! verified, already claimed, not found) rather than only fresh inserts.
//!
//! # Usage
//!
//! ```no_run
//! use mortgage_ledger_test_utils::strategies;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_property(commands in strategies::arb_command_sequence()) {
//!         // replay (caller, command) pairs against a fresh ledger
//!     }
//! }
//! ```

use mortgage_ledger_types::{
    ActionId, ActionType, Amount, LedgerCommand, LoanId, PaymentId, PaymentType, Principal,
    PropertyId, Timestamp,
};
use proptest::prelude::*;

use crate::fixtures::{NON_VERIFIER, OTHER, OWNER, VERIFIER};

/// Generates one of the four fixture principals.
pub fn arb_principal() -> impl Strategy<Value = Principal> {
    prop::sample::select(vec![OWNER, OTHER, VERIFIER, NON_VERIFIER]).prop_map(Principal::new)
}

/// Generates a principal that is never the fixture owner.
pub fn arb_non_owner() -> impl Strategy<Value = Principal> {
    prop_oneof![
        prop::sample::select(vec![OTHER, VERIFIER, NON_VERIFIER]).prop_map(Principal::new),
        "ST[5-9A-Z][0-9A-Z]{8}".prop_map(Principal::new),
    ]
}

/// Generates a property id from a pool of three.
pub fn arb_property_id() -> impl Strategy<Value = PropertyId> {
    prop::sample::select(vec!["prop1", "prop2", "prop3"]).prop_map(PropertyId::new)
}

/// Generates a payment id from a pool of three.
pub fn arb_payment_id() -> impl Strategy<Value = PaymentId> {
    prop::sample::select(vec!["payment1", "payment2", "payment3"]).prop_map(PaymentId::new)
}

/// Generates a loan id from a pool of two.
pub fn arb_loan_id() -> impl Strategy<Value = LoanId> {
    prop::sample::select(vec!["loan1", "loan2"]).prop_map(LoanId::new)
}

/// Generates an action id from a pool of three.
pub fn arb_action_id() -> impl Strategy<Value = ActionId> {
    prop::sample::select(vec!["action1", "action2", "action3"]).prop_map(ActionId::new)
}

/// Generates an amount, biased toward zero and small values.
pub fn arb_amount() -> impl Strategy<Value = Amount> {
    prop_oneof![Just(0u64), 1u64..1_000_000, any::<u64>()]
}

/// Generates a Unix timestamp in seconds between 2000 and 2100.
pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    946_684_800u64..4_102_444_800
}

/// Generates a payment type, including open tags.
pub fn arb_payment_type() -> impl Strategy<Value = PaymentType> {
    prop_oneof![
        Just(PaymentType::Interest),
        Just(PaymentType::Principal),
        Just(PaymentType::Escrow),
        "[a-z_]{1,12}".prop_map(PaymentType::from),
    ]
}

/// Generates an action type, including open tags.
pub fn arb_action_type() -> impl Strategy<Value = ActionType> {
    prop_oneof![
        Just(ActionType::Notice),
        Just(ActionType::Foreclosure),
        Just(ActionType::LoanModification),
        Just(ActionType::Forbearance),
        Just(ActionType::ShortSale),
        "[a-z_]{1,12}".prop_map(ActionType::from),
    ]
}

/// Generates short free text, sometimes empty.
pub fn arb_text() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

fn arb_property_or_payment_command() -> impl Strategy<Value = LedgerCommand> {
    prop_oneof![
        arb_principal().prop_map(|verifier| LedgerCommand::AddVerifier { verifier }),
        (arb_property_id(), arb_text(), arb_amount()).prop_map(
            |(property_id, address, valuation)| LedgerCommand::RegisterProperty {
                property_id,
                address,
                valuation,
            }
        ),
        (arb_property_id(), arb_timestamp(), arb_amount()).prop_map(
            |(property_id, inspection_date, valuation)| LedgerCommand::VerifyProperty {
                property_id,
                inspection_date,
                valuation,
            }
        ),
        (arb_payment_id(), arb_loan_id(), arb_amount(), arb_timestamp(), arb_payment_type())
            .prop_map(|(payment_id, loan_id, amount, payment_date, payment_type)| {
                LedgerCommand::RecordPayment { payment_id, loan_id, amount, payment_date, payment_type }
            }),
        arb_payment_id().prop_map(|payment_id| LedgerCommand::DistributePayment { payment_id }),
        (arb_payment_id(), arb_principal(), arb_amount()).prop_map(
            |(payment_id, investor, amount)| LedgerCommand::AllocateToInvestor {
                payment_id,
                investor,
                amount,
            }
        ),
        arb_payment_id().prop_map(|payment_id| LedgerCommand::ClaimDistribution { payment_id }),
    ]
}

fn arb_default_command() -> impl Strategy<Value = LedgerCommand> {
    prop_oneof![
        (arb_loan_id(), arb_timestamp(), 0u32..720, arb_amount(), arb_amount()).prop_map(
            |(loan_id, default_date, days_past_due, outstanding_principal, outstanding_interest)| {
                LedgerCommand::DeclareDefault {
                    loan_id,
                    default_date,
                    days_past_due,
                    outstanding_principal,
                    outstanding_interest,
                }
            }
        ),
        (arb_action_id(), arb_loan_id(), arb_action_type(), arb_timestamp(), arb_text()).prop_map(
            |(action_id, loan_id, action_type, action_date, description)| {
                LedgerCommand::CreateRecoveryAction {
                    action_id,
                    loan_id,
                    action_type,
                    action_date,
                    description,
                }
            }
        ),
        arb_action_id().prop_map(|action_id| LedgerCommand::CompleteRecoveryAction { action_id }),
        (arb_loan_id(), arb_timestamp()).prop_map(|(loan_id, resolution_date)| {
            LedgerCommand::ResolveDefault { loan_id, resolution_date }
        }),
    ]
}

/// Generates an arbitrary [`LedgerCommand`] covering every operation.
pub fn arb_command() -> impl Strategy<Value = LedgerCommand> {
    prop_oneof![7 => arb_property_or_payment_command(), 4 => arb_default_command()]
}

/// Generates a `(caller, command)` pair.
pub fn arb_call() -> impl Strategy<Value = (Principal, LedgerCommand)> {
    (arb_principal(), arb_command())
}

/// Generates 1-40 `(caller, command)` pairs.
pub fn arb_command_sequence() -> impl Strategy<Value = Vec<(Principal, LedgerCommand)>> {
    proptest::collection::vec(arb_call(), 1..40)
}
