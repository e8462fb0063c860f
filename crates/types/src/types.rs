//! Core type definitions for the mortgage ledger registries.
//!
//! - Identifier types (Principal, PropertyId, PaymentId, LoanId, ActionId)
//! - Record types for the property, payment, and default registries
//! - Lifecycle status enums and string-tagged classification enums
//! - Commands describing every mutating operation as data

use std::{borrow::Borrow, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifier Types
// ============================================================================

/// Generates a newtype wrapper around `String` for type-safe identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]` for wire format compatibility
/// - `From<&str>` and `From<String>` conversions, `Borrow<str>` for map lookups
/// - `Display` with a semantic prefix (e.g., `loan:loan123`)
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the raw identifier.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the raw string.
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

define_key!(
    /// Authenticated caller identity supplied by the calling environment.
    ///
    /// Opaque to the ledger: principals are compared, never parsed or validated.
    ///
    /// # Display
    ///
    /// Formats with `principal:` prefix: `principal:ST1PQ...`.
    Principal, "principal"
);

define_key!(
    /// Caller-supplied identifier of a property record.
    ///
    /// # Display
    ///
    /// Formats with `property:` prefix: `property:prop123`.
    PropertyId, "property"
);

define_key!(
    /// Caller-supplied identifier of a payment record.
    ///
    /// # Display
    ///
    /// Formats with `payment:` prefix: `payment:payment123`.
    PaymentId, "payment"
);

define_key!(
    /// Loan identifier. Keys the default registry and is carried as an opaque
    /// foreign key on payments and recovery actions.
    ///
    /// # Display
    ///
    /// Formats with `loan:` prefix: `loan:loan123`.
    LoanId, "loan"
);

define_key!(
    /// Caller-supplied identifier of a recovery action.
    ///
    /// # Display
    ///
    /// Formats with `action:` prefix: `action:action123`.
    ActionId, "action"
);

/// Seconds since the Unix epoch. No range policy beyond `u64`.
pub type Timestamp = u64;

/// Opaque monetary figure. Recorded, never moved.
pub type Amount = u64;

// ============================================================================
// Roles
// ============================================================================

/// Role a caller must hold to perform a gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single ledger owner fixed at initialization.
    Owner,
    /// Member of the verifier set maintained by the owner.
    Verifier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Verifier => write!(f, "verifier"),
        }
    }
}

// ============================================================================
// String-tagged classification enums
// ============================================================================

/// Generates an open, string-tagged enum.
///
/// Known tags map to named variants; any other tag is preserved verbatim in
/// `Other`. Serializes as the bare tag string, so a hand-built `Other` that
/// spells a known tag decodes as the named variant; `normalized` gives the
/// form that survives a round-trip.
macro_rules! define_tag {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Tag outside the named set, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Returns the wire tag.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $tag, )+
                    Self::Other(tag) => tag,
                }
            }

            /// Folds an `Other` tag that spells a named variant into that variant.
            pub fn normalized(self) -> Self {
                Self::from(String::from(self))
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                match tag.as_str() {
                    $( $tag => Self::$variant, )+
                    _ => Self::Other(tag),
                }
            }
        }

        impl From<&str> for $name {
            fn from(tag: &str) -> Self {
                Self::from(tag.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(tag) => tag,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_tag!(
    /// Classification of a recorded loan payment.
    PaymentType {
        /// Interest portion of a scheduled payment.
        Interest => "interest",
        /// Principal reduction.
        Principal => "principal",
        /// Escrow deposit (taxes, insurance).
        Escrow => "escrow",
    }
);

define_tag!(
    /// Kind of recovery step taken against a defaulted loan.
    ActionType {
        /// Default notice sent to the borrower.
        Notice => "notice",
        /// Foreclosure proceedings.
        Foreclosure => "foreclosure",
        /// Loan modification offered or agreed.
        LoanModification => "loan_modification",
        /// Temporary payment suspension.
        Forbearance => "forbearance",
        /// Sale of the collateral below the outstanding balance.
        ShortSale => "short_sale",
    }
);

// ============================================================================
// Property Registry records
// ============================================================================

/// Property verification lifecycle. One-way: `Pending` to `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    /// Registered, awaiting inspection.
    #[default]
    Pending,
    /// Inspected by a verifier. Terminal.
    Verified,
}

/// Registered collateral property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Principal that registered the property. Immutable after registration.
    pub owner: Principal,
    /// Street address.
    pub address: String,
    /// Date of the verifying inspection, `0` until verified.
    pub last_inspection_date: Timestamp,
    /// Current valuation. Replaced by the verifier's appraisal.
    pub valuation: Amount,
    /// Verification state.
    pub status: PropertyStatus,
}

impl PropertyRecord {
    /// Creates a freshly registered, unverified record.
    pub fn pending(owner: Principal, address: impl Into<String>, valuation: Amount) -> Self {
        Self {
            owner,
            address: address.into(),
            last_inspection_date: 0,
            valuation,
            status: PropertyStatus::Pending,
        }
    }

    /// Whether the property has been verified.
    #[inline]
    pub fn is_verified(&self) -> bool {
        self.status == PropertyStatus::Verified
    }
}

// ============================================================================
// Payment Registry records
// ============================================================================

/// Recorded loan payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Loan the payment belongs to. Not checked against any loan store.
    pub loan_id: LoanId,
    /// Payment amount.
    pub amount: Amount,
    /// Date the payment was received.
    pub payment_date: Timestamp,
    /// Payment classification.
    pub payment_type: PaymentType,
    /// Set once by `distribute_payment`.
    pub distributed: bool,
}

/// Composite key of a per-investor distribution.
///
/// Ordered payment-first, so every allocation of one payment forms a
/// contiguous range in an ordered map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DistributionKey {
    /// Payment the allocation is drawn from.
    pub payment_id: PaymentId,
    /// Investor entitled to claim the allocation.
    pub investor: Principal,
}

impl DistributionKey {
    /// Creates a composite key.
    pub fn new(payment_id: impl Into<PaymentId>, investor: impl Into<Principal>) -> Self {
        Self { payment_id: payment_id.into(), investor: investor.into() }
    }
}

impl fmt::Display for DistributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.payment_id, self.investor)
    }
}

/// Per-investor allocation of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    /// Allocated amount.
    pub amount: Amount,
    /// Set once by the investor's claim.
    pub claimed: bool,
}

// ============================================================================
// Default Registry records
// ============================================================================

/// Default lifecycle of a loan. Entry is once-only; exit may be repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultStatus {
    /// Default declared and unresolved.
    Defaulted,
    /// Default resolved at the given date.
    Resolved {
        /// Date of the most recent resolution.
        resolution_date: Timestamp,
    },
}

impl fmt::Display for DefaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultStatus::Defaulted => write!(f, "defaulted"),
            DefaultStatus::Resolved { .. } => write!(f, "resolved"),
        }
    }
}

/// Declared loan default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRecord {
    /// Date the default was declared effective.
    pub default_date: Timestamp,
    /// Delinquency at declaration.
    pub days_past_due: u32,
    /// Principal outstanding at declaration.
    pub outstanding_principal: Amount,
    /// Interest outstanding at declaration.
    pub outstanding_interest: Amount,
    /// Current lifecycle state.
    pub status: DefaultStatus,
}

impl DefaultRecord {
    /// Returns the resolution date, `None` while the loan is still in default.
    pub fn resolution_date(&self) -> Option<Timestamp> {
        match self.status {
            DefaultStatus::Defaulted => None,
            DefaultStatus::Resolved { resolution_date } => Some(resolution_date),
        }
    }

    /// Whether the default has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, DefaultStatus::Resolved { .. })
    }
}

/// Recovery step taken against a defaulted loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryActionRecord {
    /// Defaulted loan the action belongs to. Checked only at creation.
    pub loan_id: LoanId,
    /// Kind of action.
    pub action_type: ActionType,
    /// Date the action was taken.
    pub action_date: Timestamp,
    /// Free-form description.
    pub description: String,
    /// Set by `complete_recovery_action`. Never cleared.
    pub completed: bool,
}

// ============================================================================
// Commands
// ============================================================================

/// A mutating ledger operation expressed as data.
///
/// The caller is supplied alongside the command, never inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    /// Adds a principal to the verifier set.
    AddVerifier {
        /// Principal to grant the verifier role.
        verifier: Principal,
    },
    /// Registers (or re-registers) a property.
    RegisterProperty {
        /// Property key.
        property_id: PropertyId,
        /// Street address.
        address: String,
        /// Initial valuation.
        valuation: Amount,
    },
    /// Verifies a registered property.
    VerifyProperty {
        /// Property key.
        property_id: PropertyId,
        /// Inspection date.
        inspection_date: Timestamp,
        /// Appraised valuation.
        valuation: Amount,
    },
    /// Records (or re-records) a payment.
    RecordPayment {
        /// Payment key.
        payment_id: PaymentId,
        /// Loan reference.
        loan_id: LoanId,
        /// Payment amount.
        amount: Amount,
        /// Payment date.
        payment_date: Timestamp,
        /// Payment classification.
        payment_type: PaymentType,
    },
    /// Marks a payment as distributed.
    DistributePayment {
        /// Payment key.
        payment_id: PaymentId,
    },
    /// Upserts an investor allocation.
    AllocateToInvestor {
        /// Payment key.
        payment_id: PaymentId,
        /// Receiving investor.
        investor: Principal,
        /// Allocated amount.
        amount: Amount,
    },
    /// Claims the caller's own allocation.
    ClaimDistribution {
        /// Payment key.
        payment_id: PaymentId,
    },
    /// Declares a loan default.
    DeclareDefault {
        /// Loan key.
        loan_id: LoanId,
        /// Default date.
        default_date: Timestamp,
        /// Days past due.
        days_past_due: u32,
        /// Outstanding principal.
        outstanding_principal: Amount,
        /// Outstanding interest.
        outstanding_interest: Amount,
    },
    /// Creates (or re-creates) a recovery action.
    CreateRecoveryAction {
        /// Action key.
        action_id: ActionId,
        /// Defaulted loan.
        loan_id: LoanId,
        /// Kind of action.
        action_type: ActionType,
        /// Action date.
        action_date: Timestamp,
        /// Description.
        description: String,
    },
    /// Marks a recovery action completed.
    CompleteRecoveryAction {
        /// Action key.
        action_id: ActionId,
    },
    /// Resolves a declared default.
    ResolveDefault {
        /// Loan key.
        loan_id: LoanId,
        /// Resolution date.
        resolution_date: Timestamp,
    },
}

impl LedgerCommand {
    /// Stable operation name for logs and diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddVerifier { .. } => "add_verifier",
            Self::RegisterProperty { .. } => "register_property",
            Self::VerifyProperty { .. } => "verify_property",
            Self::RecordPayment { .. } => "record_payment",
            Self::DistributePayment { .. } => "distribute_payment",
            Self::AllocateToInvestor { .. } => "allocate_to_investor",
            Self::ClaimDistribution { .. } => "claim_distribution",
            Self::DeclareDefault { .. } => "declare_default",
            Self::CreateRecoveryAction { .. } => "create_recovery_action",
            Self::CompleteRecoveryAction { .. } => "complete_recovery_action",
            Self::ResolveDefault { .. } => "resolve_default",
        }
    }

    /// Role the caller must hold, or `None` when the caller's identity is
    /// itself the key (a claim is authorized by owning the allocation).
    pub const fn required_role(&self) -> Option<Role> {
        match self {
            Self::VerifyProperty { .. } => Some(Role::Verifier),
            Self::ClaimDistribution { .. } => None,
            _ => Some(Role::Owner),
        }
    }
}
