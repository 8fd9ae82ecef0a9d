//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database, building request contexts
//! for each role, and creating fixture rows with sensible defaults.

use crate::{
    config,
    core::{
        category::{self, CreateCategory},
        context::{MemberRole, RequestContext},
        income::{self, CreateIncomeEvent},
        payment::{self, CreatePayment},
    },
    entities::{self, Frequency, PaymentType},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a context with the given role for `family_id`.
pub fn ctx_with_role(family_id: i64, role: MemberRole) -> RequestContext {
    RequestContext {
        family_id,
        user_id: "test-user".to_string(),
        role,
    }
}

/// Editor context for `family_id`.
pub fn editor_ctx(family_id: i64) -> RequestContext {
    ctx_with_role(family_id, MemberRole::Editor)
}

/// Admin context for `family_id`.
pub fn admin_ctx(family_id: i64) -> RequestContext {
    ctx_with_role(family_id, MemberRole::Admin)
}

/// Viewer context for `family_id`.
pub fn viewer_ctx(family_id: i64) -> RequestContext {
    ctx_with_role(family_id, MemberRole::Viewer)
}

/// A monthly paycheck: $2500.00 from "Acme", scheduled 2024-06-01.
pub fn paycheck_input() -> CreateIncomeEvent {
    CreateIncomeEvent {
        name: "Paycheck".to_string(),
        amount: dec!(2500.00),
        scheduled_date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
        frequency: Frequency::Monthly,
        source: Some("Acme".to_string()),
        notes: None,
    }
}

/// A monthly rent payment: $1500.00 to "Landlord", due 2024-06-05.
pub fn rent_input() -> CreatePayment {
    CreatePayment {
        payee: "Landlord".to_string(),
        amount: dec!(1500.00),
        due_date: NaiveDate::from_ymd_opt(2024, 6, 5).expect("valid date"),
        payment_type: PaymentType::Recurring,
        frequency: Frequency::Monthly,
        spending_category_id: None,
        auto_pay: false,
        notes: None,
    }
}

/// Creates the standard test income event for the context's family.
pub async fn create_test_income(
    db: &DatabaseConnection,
    ctx: &RequestContext,
) -> Result<entities::income_event::Model> {
    income::create(db, ctx, paycheck_input()).await
}

/// Creates the standard test payment for the context's family.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
) -> Result<entities::payment::Model> {
    payment::create(db, ctx, rent_input()).await
}

/// Creates an active category with the given name and percentage.
pub async fn create_test_category(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    name: &str,
    target_percentage: Decimal,
) -> Result<entities::budget_category::Model> {
    category::create(
        db,
        ctx,
        CreateCategory {
            name: name.to_string(),
            target_percentage,
            color: None,
            sort_order: None,
        },
    )
    .await
}
