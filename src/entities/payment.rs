//! Payment entity - Represents bills and other scheduled obligations.
//!
//! Payments optionally belong to a budget category and are linked to income
//! events through attributions. `overdue` is computed at read time from the
//! due date; the stored status only ever holds the states a transition can
//! produce.

use super::enums::{Frequency, PaymentStatus, PaymentType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Family that owns this payment
    pub family_id: i64,
    /// Who gets paid
    pub payee: String,
    /// Amount due in dollars
    pub amount: Decimal,
    /// When the payment is due
    pub due_date: Date,
    /// Whether this is a one-off, recurring, or variable obligation
    pub payment_type: PaymentType,
    /// Repetition rule
    pub frequency: Frequency,
    /// Lifecycle status
    pub status: PaymentStatus,
    /// Next due date, derived from `due_date` + `frequency`
    pub next_due_date: Option<Date>,
    /// Date the payment was made
    pub paid_date: Option<Date>,
    /// Total paid so far (accumulates across partial payments)
    pub paid_amount: Option<Decimal>,
    /// Budget category this payment spends from
    pub spending_category_id: Option<i64>,
    /// Whether the payment is made automatically by the bank
    pub auto_pay: bool,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between payments and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment may spend from one budget category
    #[sea_orm(
        belongs_to = "super::budget_category::Entity",
        from = "Column::SpendingCategoryId",
        to = "super::budget_category::Column::Id"
    )]
    SpendingCategory,
    /// One payment has many attributions
    #[sea_orm(has_many = "super::attribution::Entity")]
    Attributions,
}

impl Related<super::budget_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SpendingCategory.def()
    }
}

impl Related<super::attribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
