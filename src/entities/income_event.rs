//! Income event entity - Represents expected and received income.
//!
//! Each income event belongs to one family and tracks the scheduled amount,
//! the actual amount once received, and the running attribution counters.
//! The invariant `remaining_amount = (actual_amount ?? amount) -
//! allocated_amount` is maintained by the income store and the allocation
//! engine on every write.

use super::enums::{Frequency, IncomeStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "income_events")]
pub struct Model {
    /// Unique identifier for the income event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Family that owns this event; all reads are scoped to it
    pub family_id: i64,
    /// Human-readable name (e.g. "Paycheck", "Tax refund")
    pub name: String,
    /// Expected amount in dollars
    pub amount: Decimal,
    /// Date the income is expected
    pub scheduled_date: Date,
    /// Repetition rule
    pub frequency: Frequency,
    /// Where the money comes from (employer, client, ...)
    pub source: Option<String>,
    /// Lifecycle status
    pub status: IncomeStatus,
    /// Next expected date, derived from `scheduled_date` + `frequency`;
    /// None when the frequency is `once`
    pub next_occurrence: Option<Date>,
    /// Date the income actually arrived, set by mark-received
    pub actual_date: Option<Date>,
    /// Amount that actually arrived, set by mark-received
    pub actual_amount: Option<Decimal>,
    /// Total attributed to payments so far
    pub allocated_amount: Decimal,
    /// Amount still available for attribution, never negative
    pub remaining_amount: Decimal,
    /// Free-form notes
    pub notes: Option<String>,
}

impl Model {
    /// The amount attributions are measured against: the actual amount once
    /// received, the scheduled amount before that.
    #[must_use]
    pub fn effective_amount(&self) -> Decimal {
        self.actual_amount.unwrap_or(self.amount)
    }
}

/// Defines relationships between income events and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One income event has many attributions
    #[sea_orm(has_many = "super::attribution::Entity")]
    Attributions,
}

impl Related<super::attribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
