//! Error types for the mortgage ledger registries using snafu.
//!
//! Every failure is a normal, reported outcome that leaves the ledger
//! untouched. The taxonomy captures:
//! - Authorization errors (caller lacks the owner or verifier role)
//! - Lifecycle errors (one-shot transition already taken)
//! - Not-found errors (one discriminant per store)
//! - Infrastructure errors (validation, codec, configuration, I/O)
//!
//! Each error variant maps to an [`ErrorCode`] with a unique numeric identifier,
//! retryability classification, and suggested recovery action.

use core::fmt;

use snafu::{Location, Snafu};

use crate::{
    config::ConfigError,
    types::{ActionId, LoanId, PaymentId, Principal, PropertyId, Role},
};

/// Unified result type for ledger operations.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Machine-readable error codes for programmatic error handling.
///
/// Codes are organized into ranges:
///
/// | Range     | Domain         | Examples                                  |
/// |-----------|----------------|-------------------------------------------|
/// | 1000–1099 | Authorization  | Missing owner or verifier role            |
/// | 2000–2099 | Property       | Property not found, already verified      |
/// | 3000–3099 | Payment        | Payment/distribution not found, claimed   |
/// | 4000–4099 | Default        | Default/action not found, already declared|
/// | 9000–9099 | Infrastructure | Invalid argument, serialization, config   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // --- Authorization (1000–1099) ---
    /// Caller lacks the role the operation requires.
    NotAuthorized = 1000,

    // --- Property registry (2000–2099) ---
    /// No property record at the given key.
    PropertyNotFound = 2000,
    /// Property was already verified.
    AlreadyVerified = 2001,

    // --- Payment registry (3000–3099) ---
    /// No payment record at the given key.
    PaymentNotFound = 3000,
    /// Payment was already distributed.
    AlreadyDistributed = 3001,
    /// No allocation for the (payment, investor) pair.
    DistributionNotFound = 3002,
    /// Allocation was already claimed.
    AlreadyClaimed = 3003,

    // --- Default registry (4000–4099) ---
    /// No default declared for the loan.
    DefaultNotFound = 4000,
    /// A default was already declared for the loan.
    AlreadyDeclared = 4001,
    /// No recovery action at the given key.
    ActionNotFound = 4002,

    // --- Infrastructure (9000–9099) ---
    /// Invalid request argument.
    InvalidArgument = 9000,
    /// Snapshot encoding or decoding failed.
    Serialization = 9001,
    /// Configuration error.
    Config = 9002,
    /// Filesystem I/O error.
    Io = 9003,
}

impl ErrorCode {
    /// Returns the numeric code value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts a numeric code to an `ErrorCode`, returning `None` for unknown values.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::NotAuthorized),
            2000 => Some(Self::PropertyNotFound),
            2001 => Some(Self::AlreadyVerified),
            3000 => Some(Self::PaymentNotFound),
            3001 => Some(Self::AlreadyDistributed),
            3002 => Some(Self::DistributionNotFound),
            3003 => Some(Self::AlreadyClaimed),
            4000 => Some(Self::DefaultNotFound),
            4001 => Some(Self::AlreadyDeclared),
            4002 => Some(Self::ActionNotFound),
            9000 => Some(Self::InvalidArgument),
            9001 => Some(Self::Serialization),
            9002 => Some(Self::Config),
            9003 => Some(Self::Io),
            _ => None,
        }
    }

    /// Whether this error is retryable.
    ///
    /// Registry failures are deterministic: retrying the same call against the
    /// same state fails the same way. Only I/O may be transient.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Io)
    }

    /// Suggested recovery action for this error code.
    #[must_use]
    pub const fn suggested_action(self) -> &'static str {
        match self {
            Self::NotAuthorized => {
                "Submit the operation as the ledger owner, or have the owner grant the verifier role."
            },
            Self::PropertyNotFound => "Register the property before verifying it.",
            Self::AlreadyVerified => "Not retryable. The property is verified; read its record instead.",
            Self::PaymentNotFound => "Record the payment before distributing it.",
            Self::AlreadyDistributed => "Not retryable. The payment is already marked distributed.",
            Self::DistributionNotFound => {
                "Verify the payment ID and that the owner allocated to this investor."
            },
            Self::AlreadyClaimed => "Not retryable. The allocation was already claimed.",
            Self::DefaultNotFound => "Declare the default for this loan first.",
            Self::AlreadyDeclared => {
                "Not retryable. A default exists for this loan; resolve or amend through recovery actions."
            },
            Self::ActionNotFound => "Create the recovery action before completing it.",
            Self::InvalidArgument => "Fix the request parameters and resubmit.",
            Self::Serialization => {
                "Snapshot bytes are corrupt or from an unsupported format version."
            },
            Self::Config => "Fix the configuration value and restart.",
            Self::Io => "Check the file path and permissions. May be retryable.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Top-level error type for ledger operations.
///
/// No variant is ever produced after a partial write: every operation checks
/// authorization, then arguments, then record state, and mutates only when
/// all checks pass.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LedgerError {
    /// Caller does not hold the role the operation requires.
    #[snafu(display("{caller} is not authorized: {required} role required"))]
    NotAuthorized {
        /// Rejected caller.
        caller: Principal,
        /// Role the operation requires.
        required: Role,
    },

    /// Property not found.
    #[snafu(display("Property not found: {property_id}"))]
    PropertyNotFound {
        /// Property key.
        property_id: PropertyId,
    },

    /// Property already verified.
    #[snafu(display("Property already verified: {property_id}"))]
    AlreadyVerified {
        /// Property key.
        property_id: PropertyId,
    },

    /// Payment not found.
    #[snafu(display("Payment not found: {payment_id}"))]
    PaymentNotFound {
        /// Payment key.
        payment_id: PaymentId,
    },

    /// Payment already distributed.
    #[snafu(display("Payment already distributed: {payment_id}"))]
    AlreadyDistributed {
        /// Payment key.
        payment_id: PaymentId,
    },

    /// No allocation exists for this investor on this payment.
    #[snafu(display("Distribution not found: {payment_id} for {investor}"))]
    DistributionNotFound {
        /// Payment key.
        payment_id: PaymentId,
        /// Investor half of the composite key.
        investor: Principal,
    },

    /// Allocation already claimed.
    #[snafu(display("Distribution already claimed: {payment_id} by {investor}"))]
    AlreadyClaimed {
        /// Payment key.
        payment_id: PaymentId,
        /// Investor half of the composite key.
        investor: Principal,
    },

    /// No default declared for the loan.
    #[snafu(display("Default not found: {loan_id}"))]
    DefaultNotFound {
        /// Loan key.
        loan_id: LoanId,
    },

    /// A default was already declared for the loan.
    #[snafu(display("Default already declared: {loan_id}"))]
    AlreadyDeclared {
        /// Loan key.
        loan_id: LoanId,
    },

    /// Recovery action not found.
    #[snafu(display("Recovery action not found: {action_id}"))]
    ActionNotFound {
        /// Action key.
        action_id: ActionId,
    },

    /// Invalid argument (empty or oversized identifier, oversized text).
    #[snafu(display("Invalid argument: {message}"))]
    InvalidArgument {
        /// Error description.
        message: String,
    },

    /// Snapshot encoding or decoding failed.
    #[snafu(display("Serialization error at {location}: {message}"))]
    Serialization {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Configuration error (invalid value or unparsable document).
    #[snafu(display("Configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },

    /// I/O error reading a configuration file.
    #[snafu(display("I/O error at {location}: {source}"))]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}

impl LedgerError {
    /// Returns the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotAuthorized { .. } => ErrorCode::NotAuthorized,
            Self::PropertyNotFound { .. } => ErrorCode::PropertyNotFound,
            Self::AlreadyVerified { .. } => ErrorCode::AlreadyVerified,
            Self::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
            Self::AlreadyDistributed { .. } => ErrorCode::AlreadyDistributed,
            Self::DistributionNotFound { .. } => ErrorCode::DistributionNotFound,
            Self::AlreadyClaimed { .. } => ErrorCode::AlreadyClaimed,
            Self::DefaultNotFound { .. } => ErrorCode::DefaultNotFound,
            Self::AlreadyDeclared { .. } => ErrorCode::AlreadyDeclared,
            Self::ActionNotFound { .. } => ErrorCode::ActionNotFound,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Serialization { .. } => ErrorCode::Serialization,
            Self::Config { .. } => ErrorCode::Config,
            Self::Io { .. } => ErrorCode::Io,
        }
    }

    /// Contract-level abort reason reported to the ledger runtime.
    ///
    /// Each registry numbers its own failures, so the same value means
    /// different things in different registries. A missing verifier role is
    /// reported as 103; a missing owner role as 100. Infrastructure errors
    /// never reach the runtime as an abort and return `None`.
    #[must_use]
    pub const fn abort_code(&self) -> Option<u32> {
        match self {
            Self::NotAuthorized { required: Role::Owner, .. } => Some(100),
            Self::NotAuthorized { required: Role::Verifier, .. } => Some(103),
            // Property registry
            Self::AlreadyVerified { .. } => Some(101),
            Self::PropertyNotFound { .. } => Some(102),
            // Payment registry
            Self::PaymentNotFound { .. } => Some(101),
            Self::AlreadyDistributed { .. } => Some(102),
            Self::DistributionNotFound { .. } => Some(103),
            Self::AlreadyClaimed { .. } => Some(104),
            // Default registry
            Self::AlreadyDeclared { .. } => Some(102),
            Self::ActionNotFound { .. } => Some(103),
            Self::DefaultNotFound { .. } => Some(104),
            Self::InvalidArgument { .. }
            | Self::Serialization { .. }
            | Self::Config { .. }
            | Self::Io { .. } => None,
        }
    }

    /// Whether this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Suggested recovery action for this error.
    #[must_use]
    pub const fn suggested_action(&self) -> &'static str {
        self.code().suggested_action()
    }
}

impl From<ConfigError> for LedgerError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { source, .. } => {
                let loc = std::panic::Location::caller();
                LedgerError::Io {
                    source,
                    location: Location::new(loc.file(), loc.line(), loc.column()),
                }
            },
            other => LedgerError::Config { message: other.to_string() },
        }
    }
}

impl From<crate::validation::ValidationError> for LedgerError {
    fn from(err: crate::validation::ValidationError) -> Self {
        LedgerError::InvalidArgument { message: err.to_string() }
    }
}

impl From<crate::codec::CodecError> for LedgerError {
    #[track_caller]
    fn from(err: crate::codec::CodecError) -> Self {
        let loc = std::panic::Location::caller();
        LedgerError::Serialization {
            message: err.to_string(),
            location: Location::new(loc.file(), loc.line(), loc.column()),
        }
    }
}
