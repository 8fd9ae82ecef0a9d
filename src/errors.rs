//! Unified error types and result handling.
//!
//! Every store and engine operation returns [`Result`], raising the specific
//! taxonomy kind for its failure. The API layer owns the mapping from each
//! kind to an HTTP status and response payload; nothing in this module knows
//! about status codes.

use rust_decimal::Decimal;
use thiserror::Error;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input. The field name is included so the
    /// client can see which part of the request was rejected.
    #[error("Validation failed on `{field}`: {message}")]
    Validation {
        /// Name of the offending input field
        field: &'static str,
        /// Human-readable explanation
        message: String,
    },

    /// The resource does not exist, or belongs to another family. The two
    /// cases are deliberately indistinguishable to the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"income event"`
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// A status change that is not in the entity's transition table.
    #[error("{entity} cannot transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Entity kind
        entity: &'static str,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Another active category with the same name (case-insensitive) already
    /// exists for this family.
    #[error("A budget category named \"{name}\" already exists")]
    DuplicateCategoryName {
        /// The rejected name
        name: String,
    },

    /// Creating or updating the category would push the family's active
    /// percentages over 100.
    #[error("Budget percentage total would reach {attempted}%, exceeding 100%")]
    BudgetPercentageExceeded {
        /// Sum of active percentages including the rejected value
        attempted: Decimal,
    },

    /// A paid payment only accepts edits to notes and spending category.
    #[error("Paid payments cannot be modified")]
    CannotUpdatePaidPayment,

    /// The payment has already been paid or cancelled.
    #[error("Payment is already {status}")]
    PaymentAlreadySettled {
        /// The payment's terminal status
        status: String,
    },

    /// The attribution amount exceeds what is left of the income event.
    /// Also raised when a concurrent attribution won the race for the
    /// remaining balance; the client should re-read and retry.
    #[error("Requested {requested} exceeds remaining income of {remaining}")]
    InsufficientRemainingIncome {
        /// Amount the caller asked to attribute
        requested: Decimal,
        /// Remaining balance at the time of the check
        remaining: Decimal,
    },

    /// The caller's role does not permit this operation.
    #[error("This operation requires the {required} role")]
    Forbidden {
        /// Minimum role that would be accepted
        required: &'static str,
    },

    /// Missing, malformed, or expired bearer token.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Reason, safe to return to the client
        message: String,
    },

    /// Configuration error during startup.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error, surfaced to clients as an opaque internal error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (socket binding, config file reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code for the API error payload.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::DuplicateCategoryName { .. } => "duplicate_category_name",
            Self::BudgetPercentageExceeded { .. } => "budget_percentage_exceeded",
            Self::CannotUpdatePaidPayment => "cannot_update_paid_payment",
            Self::PaymentAlreadySettled { .. } => "payment_already_settled",
            Self::InsufficientRemainingIncome { .. } => "insufficient_remaining_income",
            Self::Forbidden { .. } => "forbidden",
            Self::Authentication { .. } => "authentication_error",
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => "internal_error",
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
