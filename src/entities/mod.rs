//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attribution;
pub mod budget_category;
pub mod enums;
pub mod income_event;
pub mod payment;

// Re-export specific types to avoid conflicts
pub use attribution::{
    Column as AttributionColumn, Entity as Attribution, Model as AttributionModel,
};
pub use budget_category::{
    Column as BudgetCategoryColumn, Entity as BudgetCategory, Model as BudgetCategoryModel,
};
pub use enums::{AttributionType, Frequency, IncomeStatus, PaymentStatus, PaymentType};
pub use income_event::{
    Column as IncomeEventColumn, Entity as IncomeEvent, Model as IncomeEventModel,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
