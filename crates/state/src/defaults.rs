//! Loan default registry and recovery actions.
//!
//! A default is declared once per loan and may be resolved any number of
//! times; each resolution overwrites the resolution date. Recovery actions
//! require a declared default at creation only, and stay valid after the
//! default is resolved.

use std::collections::BTreeMap;

use mortgage_ledger_types::{
    ActionId, ActionType, Amount, DefaultRecord, DefaultStatus, LedgerError, LoanId, Principal,
    RecoveryActionRecord, Role, Timestamp,
    error::{ActionNotFoundSnafu, AlreadyDeclaredSnafu, DefaultNotFoundSnafu},
    validation::{ValidationConfig, validate_identifier, validate_text},
};
use snafu::{OptionExt, ensure};
use tracing::info;

use crate::access::AccessControl;

/// Keyed store of loan defaults plus the recovery actions taken against them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultRegistry {
    defaults: BTreeMap<LoanId, DefaultRecord>,
    actions: BTreeMap<ActionId, RecoveryActionRecord>,
    limits: ValidationConfig,
}

impl DefaultRegistry {
    /// Creates an empty registry enforcing `limits` on new records.
    pub fn new(limits: ValidationConfig) -> Self {
        Self { defaults: BTreeMap::new(), actions: BTreeMap::new(), limits }
    }

    pub(crate) fn from_records(
        limits: ValidationConfig,
        defaults: BTreeMap<LoanId, DefaultRecord>,
        actions: BTreeMap<ActionId, RecoveryActionRecord>,
    ) -> Self {
        Self { defaults, actions, limits }
    }

    /// Declares a loan in default.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::InvalidArgument`] if `loan_id` violates the limits.
    /// - [`LedgerError::AlreadyDeclared`] if any default record exists for the
    ///   loan, resolved or not.
    #[allow(clippy::too_many_arguments)]
    pub fn declare(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        loan_id: LoanId,
        default_date: Timestamp,
        days_past_due: u32,
        outstanding_principal: Amount,
        outstanding_interest: Amount,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        validate_identifier("loan_id", loan_id.as_str(), &self.limits)?;
        ensure!(!self.defaults.contains_key(&loan_id), AlreadyDeclaredSnafu { loan_id });

        info!(loan_id = %loan_id, days_past_due, outstanding_principal, outstanding_interest, "Default declared");
        self.defaults.insert(
            loan_id,
            DefaultRecord {
                default_date,
                days_past_due,
                outstanding_principal,
                outstanding_interest,
                status: DefaultStatus::Defaulted,
            },
        );
        Ok(())
    }

    /// Creates a recovery action against a declared default.
    ///
    /// Any existing action under `action_id` is replaced, including a
    /// completed one.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::InvalidArgument`] if an id, the type tag, or the
    ///   description violates the limits.
    /// - [`LedgerError::DefaultNotFound`] if no default exists for `loan_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_action(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        action_id: ActionId,
        loan_id: LoanId,
        action_type: ActionType,
        action_date: Timestamp,
        description: String,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        validate_identifier("action_id", action_id.as_str(), &self.limits)?;
        validate_identifier("loan_id", loan_id.as_str(), &self.limits)?;
        validate_text("action_type", action_type.as_str(), &self.limits)?;
        validate_text("description", &description, &self.limits)?;
        ensure!(self.defaults.contains_key(&loan_id), DefaultNotFoundSnafu { loan_id });

        let replaced = self
            .actions
            .insert(
                action_id.clone(),
                RecoveryActionRecord {
                    loan_id: loan_id.clone(),
                    action_type: action_type.normalized(),
                    action_date,
                    description,
                    completed: false,
                },
            )
            .is_some();
        info!(action_id = %action_id, loan_id = %loan_id, replaced, "Recovery action created");
        Ok(())
    }

    /// Marks a recovery action completed. Completing again is a successful no-op.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::ActionNotFound`] if no action exists.
    pub fn complete_action(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        action_id: &ActionId,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        let action = self
            .actions
            .get_mut(action_id)
            .context(ActionNotFoundSnafu { action_id: action_id.clone() })?;

        action.completed = true;
        info!(action_id = %action_id, loan_id = %action.loan_id, "Recovery action completed");
        Ok(())
    }

    /// Resolves a declared default at `resolution_date`.
    ///
    /// Resolving an already resolved default succeeds and overwrites the date.
    /// The declaration fields are left untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] if `caller` is not the owner.
    /// - [`LedgerError::DefaultNotFound`] if no default exists for the loan.
    pub fn resolve(
        &mut self,
        gate: &AccessControl,
        caller: &Principal,
        loan_id: &LoanId,
        resolution_date: Timestamp,
    ) -> Result<(), LedgerError> {
        gate.require(caller, Role::Owner)?;
        let record = self
            .defaults
            .get_mut(loan_id)
            .context(DefaultNotFoundSnafu { loan_id: loan_id.clone() })?;

        let previous = record.resolution_date();
        record.status = DefaultStatus::Resolved { resolution_date };
        info!(loan_id = %loan_id, resolution_date, ?previous, "Default resolved");
        Ok(())
    }

    /// Returns the default record for `loan_id`, if any.
    pub fn get_default(&self, loan_id: &str) -> Option<&DefaultRecord> {
        self.defaults.get(loan_id)
    }

    /// Returns the recovery action for `action_id`, if any.
    pub fn get_recovery_action(&self, action_id: &str) -> Option<&RecoveryActionRecord> {
        self.actions.get(action_id)
    }

    /// Returns every recovery action recorded against `loan_id`, in action-id order.
    pub fn recovery_actions_for_loan<'a>(
        &'a self,
        loan_id: &'a LoanId,
    ) -> impl Iterator<Item = (&'a ActionId, &'a RecoveryActionRecord)> + 'a {
        // Actions are keyed by their own id; the loan is a field.
        self.actions.iter().filter(move |(_, action)| &action.loan_id == loan_id)
    }

    /// Returns all default records in key order.
    pub fn defaults(&self) -> impl Iterator<Item = (&LoanId, &DefaultRecord)> {
        self.defaults.iter()
    }

    /// Returns all recovery actions in key order.
    pub fn actions(&self) -> impl Iterator<Item = (&ActionId, &RecoveryActionRecord)> {
        self.actions.iter()
    }
}
