//! Budget category business logic.
//!
//! Categories are named percentage buckets. Two cross-row invariants are
//! enforced here inside one transaction per write: the active percentages of
//! a family never sum past 100, and names are unique per family ignoring
//! case. A rejected write leaves the stored state untouched.

use crate::{
    core::context::RequestContext,
    entities::{BudgetCategory, budget_category},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Display color used when the client does not pick one
const DEFAULT_COLOR: &str = "#607d8b";

/// Input for creating one budget category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    /// Display name, unique per family ignoring case
    pub name: String,
    /// Share of each income event, 0 < p ≤ 100
    pub target_percentage: Decimal,
    /// Display color (hex string)
    #[serde(default)]
    pub color: Option<String>,
    /// Position in list views
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Partial update for a budget category; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New percentage
    #[serde(default)]
    pub target_percentage: Option<Decimal>,
    /// New color
    #[serde(default)]
    pub color: Option<String>,
    /// New sort position
    #[serde(default)]
    pub sort_order: Option<i32>,
    /// Reactivate or deactivate
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A family's categories plus the state of the percentage pool
#[derive(Debug, Serialize)]
pub struct CategoryList {
    /// Categories in sort order
    pub categories: Vec<budget_category::Model>,
    /// Sum of active percentages
    pub total_percentage: Decimal,
    /// Whether the active percentages reach exactly 100
    pub is_complete: bool,
}

fn not_found(id: i64) -> Error {
    Error::NotFound {
        entity: "budget category",
        id,
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "name cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_percentage(percentage: Decimal) -> Result<()> {
    if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(Error::Validation {
            field: "target_percentage",
            message: format!("target percentage must be within (0, 100], got {percentage}"),
        });
    }
    Ok(())
}

/// Checks name uniqueness (case-insensitive) among the family's categories,
/// optionally excluding the row being updated.
async fn check_name_free<C>(
    db: &C,
    ctx: &RequestContext,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let lowered = name.trim().to_lowercase();
    let existing = BudgetCategory::find()
        .filter(budget_category::Column::FamilyId.eq(ctx.family_id))
        .all(db)
        .await?;
    let clash = existing
        .iter()
        .filter(|c| Some(c.id) != exclude_id)
        .any(|c| c.name.to_lowercase() == lowered);
    if clash {
        return Err(Error::DuplicateCategoryName {
            name: name.trim().to_string(),
        });
    }
    Ok(())
}

/// Checks that the family's active percentages, with `new_percentage`
/// replacing the excluded row's share, stay within 100.
async fn check_percentage_pool<C>(
    db: &C,
    ctx: &RequestContext,
    new_percentage: Decimal,
    exclude_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let others: Decimal = BudgetCategory::find()
        .filter(budget_category::Column::FamilyId.eq(ctx.family_id))
        .filter(budget_category::Column::IsActive.eq(true))
        .all(db)
        .await?
        .iter()
        .filter(|c| Some(c.id) != exclude_id)
        .map(|c| c.target_percentage)
        .sum();

    let attempted = others + new_percentage;
    if attempted > Decimal::ONE_HUNDRED {
        return Err(Error::BudgetPercentageExceeded { attempted });
    }
    Ok(())
}

/// Looks up a category within the caller's family.
async fn get_owned<C>(db: &C, ctx: &RequestContext, id: i64) -> Result<budget_category::Model>
where
    C: ConnectionTrait,
{
    BudgetCategory::find_by_id(id)
        .filter(budget_category::Column::FamilyId.eq(ctx.family_id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Creates a new active category after checking both invariants.
///
/// # Errors
/// `DuplicateCategoryName`, `BudgetPercentageExceeded`, or validation
/// errors; `Forbidden` for viewers.
pub async fn create(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    input: CreateCategory,
) -> Result<budget_category::Model> {
    ctx.require_editor()?;
    validate_name(&input.name)?;
    validate_percentage(input.target_percentage)?;

    // Both invariant checks and the insert share one transaction so a
    // concurrent write cannot slip between check and insert.
    let txn = db.begin().await?;
    check_name_free(&txn, ctx, &input.name, None).await?;
    check_percentage_pool(&txn, ctx, input.target_percentage, None).await?;

    let model = budget_category::ActiveModel {
        family_id: Set(ctx.family_id),
        name: Set(input.name.trim().to_string()),
        target_percentage: Set(input.target_percentage),
        color: Set(input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
        sort_order: Set(input.sort_order.unwrap_or(0)),
        is_active: Set(true),
        ..Default::default()
    };
    let created = model.insert(&txn).await?;
    txn.commit().await?;
    Ok(created)
}

/// Applies a partial update, re-checking whichever invariants the patch
/// touches.
///
/// # Errors
/// `NotFound` for absent/foreign ids; `DuplicateCategoryName`,
/// `BudgetPercentageExceeded`, or validation errors.
pub async fn update(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
    patch: UpdateCategory,
) -> Result<budget_category::Model> {
    ctx.require_editor()?;

    let txn = db.begin().await?;
    let existing = get_owned(&txn, ctx, id).await?;

    if let Some(name) = &patch.name {
        validate_name(name)?;
        check_name_free(&txn, ctx, name, Some(id)).await?;
    }

    let percentage = patch
        .target_percentage
        .unwrap_or(existing.target_percentage);
    let is_active = patch.is_active.unwrap_or(existing.is_active);
    if let Some(p) = patch.target_percentage {
        validate_percentage(p)?;
    }
    // The pool only matters while the category counts against it
    if is_active {
        check_percentage_pool(&txn, ctx, percentage, Some(id)).await?;
    }

    let mut active: budget_category::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(p) = patch.target_percentage {
        active.target_percentage = Set(p);
    }
    if let Some(color) = patch.color {
        active.color = Set(color);
    }
    if let Some(sort_order) = patch.sort_order {
        active.sort_order = Set(sort_order);
    }
    if let Some(flag) = patch.is_active {
        active.is_active = Set(flag);
    }
    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deactivates a category, returning its percentage to the pool. The row is
/// kept because payments and historical allocations may reference it.
///
/// # Errors
/// `NotFound` for absent/foreign ids; `Forbidden` for viewers.
pub async fn deactivate(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
) -> Result<budget_category::Model> {
    ctx.require_editor()?;
    let existing = get_owned(db, ctx, id).await?;
    let mut active: budget_category::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.update(db).await.map_err(Into::into)
}

/// Lists the family's categories in sort order, with the percentage pool
/// totals. Inactive categories are included only on request.
pub async fn list(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    include_inactive: bool,
) -> Result<CategoryList> {
    let mut query = BudgetCategory::find()
        .filter(budget_category::Column::FamilyId.eq(ctx.family_id));
    if !include_inactive {
        query = query.filter(budget_category::Column::IsActive.eq(true));
    }
    let categories = query
        .order_by_asc(budget_category::Column::SortOrder)
        .order_by_asc(budget_category::Column::Name)
        .all(db)
        .await?;

    let total_percentage: Decimal = categories
        .iter()
        .filter(|c| c.is_active)
        .map(|c| c.target_percentage)
        .sum();

    Ok(CategoryList {
        categories,
        total_percentage,
        is_complete: total_percentage == Decimal::ONE_HUNDRED,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    fn input(name: &str, percentage: Decimal) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            target_percentage: percentage,
            color: None,
            sort_order: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = admin_ctx(1);

        create(&db, &ctx, input("Needs", dec!(60))).await?;
        create(&db, &ctx, input("Wants", dec!(40))).await?;

        let listed = list(&db, &ctx, false).await?;
        assert_eq!(listed.categories.len(), 2);
        assert_eq!(listed.total_percentage, dec!(100));
        assert!(listed.is_complete);

        Ok(())
    }

    #[tokio::test]
    async fn test_percentage_validation_range() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        for bad in [dec!(0), dec!(-10), dec!(100.01)] {
            let result = create(&db, &ctx, input("Savings", bad)).await;
            assert!(matches!(
                result.unwrap_err(),
                Error::Validation {
                    field: "target_percentage",
                    ..
                }
            ));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_pool_overflow_rejected_and_state_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let a = create(&db, &ctx, input("A", dec!(60))).await?;
        create(&db, &ctx, input("B", dec!(40))).await?;

        // 60 + 40 + 10 > 100
        let result = create(&db, &ctx, input("C", dec!(10))).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BudgetPercentageExceeded { .. }
        ));

        let listed = list(&db, &ctx, false).await?;
        assert_eq!(listed.categories.len(), 2);
        assert_eq!(listed.total_percentage, dec!(100));

        // Shrink A to 50, then C fits
        update(
            &db,
            &ctx,
            a.id,
            UpdateCategory {
                target_percentage: Some(dec!(50)),
                ..Default::default()
            },
        )
        .await?;
        let c = create(&db, &ctx, input("C", dec!(10))).await?;
        assert_eq!(c.target_percentage, dec!(10));

        let listed = list(&db, &ctx, false).await?;
        assert_eq!(listed.total_percentage, dec!(100));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        create(&db, &ctx, input("Groceries", dec!(20))).await?;
        let result = create(&db, &ctx, input("  groceries ", dec!(10))).await;

        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateCategoryName { .. }
        ));

        // A different family may reuse the name
        let other = editor_ctx(2);
        assert!(create(&db, &other, input("Groceries", dec!(20))).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let category = create(&db, &ctx, input("Bills", dec!(30))).await?;
        let updated = update(
            &db,
            &ctx,
            category.id,
            UpdateCategory {
                name: Some("BILLS".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "BILLS");

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_frees_the_pool() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let a = create(&db, &ctx, input("A", dec!(70))).await?;
        create(&db, &ctx, input("B", dec!(30))).await?;

        deactivate(&db, &ctx, a.id).await?;

        let listed = list(&db, &ctx, false).await?;
        assert_eq!(listed.categories.len(), 1);
        assert_eq!(listed.total_percentage, dec!(30));
        assert!(!listed.is_complete);

        // The freed share can be claimed again
        assert!(create(&db, &ctx, input("C", dec!(70))).await.is_ok());

        // Inactive rows show up on request, without counting toward the pool
        let all = list(&db, &ctx, true).await?;
        assert_eq!(all.categories.len(), 3);
        assert_eq!(all.total_percentage, dec!(100));

        Ok(())
    }

    #[tokio::test]
    async fn test_reactivation_rechecks_the_pool() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let a = create(&db, &ctx, input("A", dec!(70))).await?;
        create(&db, &ctx, input("B", dec!(30))).await?;
        deactivate(&db, &ctx, a.id).await?;
        create(&db, &ctx, input("C", dec!(70))).await?;

        // Reactivating A would push the pool to 170
        let result = update(
            &db,
            &ctx,
            a.id,
            UpdateCategory {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BudgetPercentageExceeded { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_cross_family_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = editor_ctx(1);
        let stranger = editor_ctx(2);

        let category = create(&db, &owner, input("A", dec!(50))).await?;
        let result = update(
            &db,
            &stranger,
            category.id,
            UpdateCategory {
                target_percentage: Some(dec!(10)),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
