//! Budget category entity - Named percentage buckets for income allocation.
//!
//! Category names are unique per family (case-insensitive) and the target
//! percentages of a family's active categories may never sum past 100; both
//! rules are enforced by the category store, not the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Family that owns this category
    pub family_id: i64,
    /// Display name, unique per family ignoring case
    pub name: String,
    /// Share of each income event, 0 < p ≤ 100
    pub target_percentage: Decimal,
    /// Display color (hex string)
    pub color: String,
    /// Position in list views
    pub sort_order: i32,
    /// Inactive categories keep their history but leave the percentage pool
    pub is_active: bool,
}

/// Defines relationships between budget categories and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category is spent from by many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
