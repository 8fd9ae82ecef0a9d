//! Allocation engine - distributes income across budget categories and
//! attributes income to specific payments.
//!
//! Attribution is the one read-then-write path in the system where a stale
//! read can over-commit money, so the remaining-balance debit is a single
//! conditional UPDATE (`remaining_amount >= amount` in the WHERE clause)
//! inside the enclosing transaction. When two requests race for the same
//! remainder, the second one's UPDATE matches no rows and the request fails
//! with a conflict instead of driving the balance negative.

use crate::{
    core::{category, context::RequestContext, income, payment},
    entities::{
        Attribution, AttributionType, IncomeEvent, IncomeStatus, Payment, PaymentStatus,
        attribution, income_event, payment as payment_entity,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

/// Rounds a computed currency amount to cents, half-up.
fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One category's share of an income event
#[derive(Debug, Clone, Serialize)]
pub struct CategoryAllocation {
    /// The category
    pub category_id: i64,
    /// Category name, for display
    pub name: String,
    /// The category's percentage
    pub target_percentage: Decimal,
    /// Dollar share of the income event, rounded to cents
    pub amount: Decimal,
}

/// The computed distribution of one income event across the family's active
/// categories
#[derive(Debug, Serialize)]
pub struct AllocationPlan {
    /// The income event being distributed
    pub income_event_id: i64,
    /// Amount being distributed (actual amount once received)
    pub income_amount: Decimal,
    /// Per-category shares
    pub allocations: Vec<CategoryAllocation>,
    /// Sum of the shares, never above `income_amount`
    pub total_allocated: Decimal,
    /// Residual left when percentages sum below 100
    pub unallocated: Decimal,
}

/// Input for attributing part of an income event to a payment
#[derive(Debug, Clone, Deserialize)]
pub struct AttributePayment {
    /// The payment receiving the money
    pub payment_id: i64,
    /// Amount to attribute, must be positive
    pub amount: Decimal,
    /// Manual by default; allocation runs pass automatic
    #[serde(default)]
    pub attribution_type: Option<AttributionType>,
}

/// Rollup of one income event's attributions
#[derive(Debug, Serialize)]
pub struct AllocationSummary {
    /// The income event
    pub income_event_id: i64,
    /// Sum of attribution amounts
    pub total_allocated: Decimal,
    /// Portion of the attributed money whose payment is already paid
    pub total_spent: Decimal,
    /// `total_allocated - total_spent`
    pub total_remaining: Decimal,
    /// Attributed share of the income amount, clamped to [0, 100]
    pub allocation_percentage: Decimal,
}

/// Computes the distribution of an income event across the family's active
/// categories: each category gets `amount * percentage / 100`, rounded
/// half-up to cents. Rounding can push the raw sum a cent past the income
/// amount when percentages reach 100; the last share absorbs the difference
/// so the total never exceeds the income.
///
/// # Errors
/// `NotFound` for absent/cancelled/foreign income events.
pub async fn allocate(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    income_event_id: i64,
) -> Result<AllocationPlan> {
    let event = income::get(db, ctx, income_event_id).await?;
    let income_amount = event.effective_amount();
    let categories = category::list(db, ctx, false).await?.categories;

    let mut allocations: Vec<CategoryAllocation> = categories
        .into_iter()
        .map(|cat| CategoryAllocation {
            category_id: cat.id,
            name: cat.name,
            target_percentage: cat.target_percentage,
            amount: to_cents(income_amount * cat.target_percentage / Decimal::ONE_HUNDRED),
        })
        .collect();

    let mut total_allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    if total_allocated > income_amount {
        let excess = total_allocated - income_amount;
        if let Some(last) = allocations.last_mut() {
            last.amount -= excess;
            total_allocated -= excess;
        }
    }

    Ok(AllocationPlan {
        income_event_id,
        income_amount,
        unallocated: income_amount - total_allocated,
        total_allocated,
        allocations,
    })
}

/// Attributes `amount` of an income event to a payment, creating the link
/// row and moving the income counters, all in one transaction.
///
/// # Errors
/// `NotFound` for absent/foreign rows; `PaymentAlreadySettled` for
/// paid/cancelled payments; `InsufficientRemainingIncome` when the amount
/// exceeds the remaining balance, including when a concurrent attribution
/// claimed it first.
pub async fn attribute_payment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    income_event_id: i64,
    input: AttributePayment,
) -> Result<attribution::Model> {
    ctx.require_editor()?;
    if input.amount <= Decimal::ZERO {
        return Err(Error::Validation {
            field: "amount",
            message: format!("amount must be positive, got {}", input.amount),
        });
    }

    let txn = db.begin().await?;

    let event = income::get_owned(&txn, ctx, income_event_id).await?;
    if event.status == IncomeStatus::Cancelled {
        return Err(Error::NotFound {
            entity: "income event",
            id: income_event_id,
        });
    }
    let target = payment::get_owned(&txn, ctx, input.payment_id).await?;
    if target.status.is_settled() {
        return Err(Error::PaymentAlreadySettled {
            status: target.status.to_string(),
        });
    }
    if input.amount > event.remaining_amount {
        return Err(Error::InsufficientRemainingIncome {
            requested: input.amount,
            remaining: event.remaining_amount,
        });
    }

    // Conditional debit: only succeeds while the remainder still covers the
    // amount, so concurrent attributions cannot jointly over-allocate.
    let debit = IncomeEvent::update_many()
        .col_expr(
            income_event::Column::AllocatedAmount,
            Expr::col(income_event::Column::AllocatedAmount).add(input.amount),
        )
        .col_expr(
            income_event::Column::RemainingAmount,
            Expr::col(income_event::Column::RemainingAmount).sub(input.amount),
        )
        .filter(income_event::Column::Id.eq(income_event_id))
        .filter(income_event::Column::RemainingAmount.gte(input.amount))
        .exec(&txn)
        .await?;
    if debit.rows_affected == 0 {
        return Err(Error::InsufficientRemainingIncome {
            requested: input.amount,
            remaining: event.remaining_amount,
        });
    }

    let created = attribution::ActiveModel {
        income_event_id: Set(income_event_id),
        payment_id: Set(input.payment_id),
        amount: Set(input.amount),
        attribution_type: Set(input.attribution_type.unwrap_or(AttributionType::Manual)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(created)
}

/// Removes an attribution and returns its amount to the income event's
/// remaining balance.
///
/// # Errors
/// `NotFound` when the attribution is absent, belongs to another family, or
/// its income event no longer exists (orphan guard).
pub async fn remove_attribution(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    attribution_id: i64,
) -> Result<()> {
    ctx.require_editor()?;

    let txn = db.begin().await?;

    let link = Attribution::find_by_id(attribution_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "attribution",
            id: attribution_id,
        })?;

    // Family scoping and the orphan guard are the same lookup: an income
    // event outside the caller's family and a vanished one both read as
    // missing.
    let event = IncomeEvent::find_by_id(link.income_event_id)
        .filter(income_event::Column::FamilyId.eq(ctx.family_id))
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "income event",
            id: link.income_event_id,
        })?;

    let amount = link.amount;
    link.delete(&txn).await?;

    IncomeEvent::update_many()
        .col_expr(
            income_event::Column::AllocatedAmount,
            Expr::col(income_event::Column::AllocatedAmount).sub(amount),
        )
        .col_expr(
            income_event::Column::RemainingAmount,
            Expr::col(income_event::Column::RemainingAmount).add(amount),
        )
        .filter(income_event::Column::Id.eq(event.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(())
}

/// Lists an income event's attributions, newest first.
///
/// # Errors
/// `NotFound` for absent/cancelled/foreign income events.
pub async fn list_attributions(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    income_event_id: i64,
) -> Result<Vec<attribution::Model>> {
    income::get(db, ctx, income_event_id).await?;
    Attribution::find()
        .filter(attribution::Column::IncomeEventId.eq(income_event_id))
        .order_by_desc(attribution::Column::CreatedAt)
        .order_by_desc(attribution::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Summarizes an income event's attributions: how much is attributed, how
/// much of that has actually been paid out, and the attributed share of the
/// income amount.
///
/// # Errors
/// `NotFound` for absent/cancelled/foreign income events.
pub async fn summary(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    income_event_id: i64,
) -> Result<AllocationSummary> {
    let event = income::get(db, ctx, income_event_id).await?;
    let links = Attribution::find()
        .filter(attribution::Column::IncomeEventId.eq(income_event_id))
        .all(db)
        .await?;

    let total_allocated: Decimal = links.iter().map(|l| l.amount).sum();

    let payment_ids: Vec<i64> = links.iter().map(|l| l.payment_id).collect();
    let paid_ids: Vec<i64> = if payment_ids.is_empty() {
        Vec::new()
    } else {
        Payment::find()
            .filter(payment_entity::Column::Id.is_in(payment_ids))
            .filter(payment_entity::Column::Status.eq(PaymentStatus::Paid))
            .all(db)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect()
    };
    let total_spent: Decimal = links
        .iter()
        .filter(|l| paid_ids.contains(&l.payment_id))
        .map(|l| l.amount)
        .sum();

    let income_amount = event.effective_amount();
    let allocation_percentage =
        if income_amount == Decimal::ZERO || total_allocated == Decimal::ZERO {
            Decimal::ZERO
        } else {
            to_cents(total_allocated / income_amount * Decimal::ONE_HUNDRED)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        };

    Ok(AllocationSummary {
        income_event_id,
        total_allocated,
        total_spent,
        total_remaining: total_allocated - total_spent,
        allocation_percentage,
    })
}
