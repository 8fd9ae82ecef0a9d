//! Closed string-backed enums shared by the entity models.
//!
//! Status fields are modeled as sea-orm active enums rather than free-form
//! strings so an unknown value can never round-trip through the database.
//! The status enums also carry their transition tables; stores consult
//! `can_transition_to` before any status write and reject everything else.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repetition rule for income events and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One-off, no next occurrence
    #[sea_orm(string_value = "once")]
    Once,
    /// Every 7 days
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Every 14 days
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    /// Same day next month, clamped to month end
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Every 3 months, clamped to month end
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    /// Same month/day next year, Feb 29 clamps to Feb 28
    #[sea_orm(string_value = "annual")]
    Annual,
}

/// Lifecycle status of an income event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum IncomeStatus {
    /// Expected but not yet received
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Funds arrived; actual date and amount recorded
    #[sea_orm(string_value = "received")]
    Received,
    /// Soft-deleted
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl IncomeStatus {
    /// Status name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transition table: `scheduled` may become `received` or `cancelled`;
    /// both of those are terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Received) | (Self::Scheduled, Self::Cancelled)
        )
    }
}

impl fmt::Display for IncomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a payment.
///
/// `Overdue` is a presentation-time fact (due date passed while still
/// scheduled); it is part of the enum so clients can receive it in list
/// views, but stores never persist it and no transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet paid
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Fully paid
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Due date passed while scheduled (derived, never written)
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Partially paid, still accepting payments
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Soft-deleted
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl PaymentStatus {
    /// Status name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Partial => "partial",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transition table: `scheduled` may become `paid`, `partial`, or
    /// `cancelled`; `partial` may become `paid`; everything else is terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Paid)
                | (Self::Scheduled, Self::Partial)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::Partial, Self::Paid)
        )
    }

    /// Whether the payment no longer accepts money.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment is expected to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Single obligation
    #[sea_orm(string_value = "once")]
    Once,
    /// Fixed amount on a recurrence schedule
    #[sea_orm(string_value = "recurring")]
    Recurring,
    /// Recurs but the amount varies (e.g. utilities)
    #[sea_orm(string_value = "variable")]
    Variable,
}

/// Origin of an income↔payment attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AttributionType {
    /// User linked the payment to the income source
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Created by an allocation run
    #[sea_orm(string_value = "automatic")]
    Automatic,
}
