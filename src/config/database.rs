//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using
//! `SeaORM`. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without manual SQL.

use crate::entities::{Attribution, BudgetCategory, IncomeEvent, Payment};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database at the given URL.
///
/// # Errors
/// Returns a database error when the URL is unreachable or malformed.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// Safe to call on a fresh database only; existing tables make the schema
/// statements fail.
///
/// # Errors
/// Returns a database error when a table cannot be created.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let income_event_table = schema.create_table_from_entity(IncomeEvent);
    let payment_table = schema.create_table_from_entity(Payment);
    let budget_category_table = schema.create_table_from_entity(BudgetCategory);
    let attribution_table = schema.create_table_from_entity(Attribution);

    db.execute(builder.build(&income_event_table)).await?;
    db.execute(builder.build(&payment_table)).await?;
    db.execute(builder.build(&budget_category_table)).await?;
    db.execute(builder.build(&attribution_table)).await?;

    Ok(())
}
