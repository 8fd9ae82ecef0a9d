//! Attribution entity - A recorded link between an income event and a payment.
//!
//! Each row carries the portion of the income event put toward the payment.
//! The allocation engine keeps the income event's `allocated_amount` and
//! `remaining_amount` counters in step with these rows inside one database
//! transaction.

use super::enums::AttributionType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attributions")]
pub struct Model {
    /// Unique identifier for the attribution
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Income event the money comes from
    pub income_event_id: i64,
    /// Payment the money goes to
    pub payment_id: i64,
    /// Attributed amount in dollars
    pub amount: Decimal,
    /// Whether a user or an allocation run created this link
    pub attribution_type: AttributionType,
    /// When the attribution was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between attributions and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each attribution draws from one income event
    #[sea_orm(
        belongs_to = "super::income_event::Entity",
        from = "Column::IncomeEventId",
        to = "super::income_event::Column::Id"
    )]
    IncomeEvent,
    /// Each attribution funds one payment
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id"
    )]
    Payment,
}

impl Related<super::income_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomeEvent.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
