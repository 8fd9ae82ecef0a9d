//! Payment business logic.
//!
//! Mirrors the income store for bills and other obligations. The notable
//! differences: a paid payment only accepts edits to its notes and spending
//! category, `mark_paid` accumulates partial payments until the amount is
//! covered, and "overdue" is computed against today's date whenever a
//! payment is read, never persisted.

use crate::{
    core::{
        context::RequestContext,
        pagination::{Page, PageInfo, Paginated},
        recurrence,
    },
    entities::{
        BudgetCategory, Frequency, Payment, PaymentStatus, PaymentType, budget_category, payment,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Input for creating one payment
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    /// Who gets paid
    pub payee: String,
    /// Amount due, must be positive
    pub amount: Decimal,
    /// When the payment is due
    pub due_date: NaiveDate,
    /// One-off, recurring, or variable
    pub payment_type: PaymentType,
    /// Repetition rule
    pub frequency: Frequency,
    /// Budget category this payment spends from
    #[serde(default)]
    pub spending_category_id: Option<i64>,
    /// Whether the bank pays this automatically
    #[serde(default)]
    pub auto_pay: bool,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a payment; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePayment {
    /// New payee
    #[serde(default)]
    pub payee: Option<String>,
    /// New amount
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// New due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// New payment type
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    /// New frequency
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// New spending category
    #[serde(default)]
    pub spending_category_id: Option<i64>,
    /// New auto-pay flag
    #[serde(default)]
    pub auto_pay: Option<bool>,
    /// New notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdatePayment {
    /// Whether the patch touches anything a paid payment has locked down.
    /// Notes and the spending category stay editable after settlement.
    const fn touches_locked_fields(&self) -> bool {
        self.payee.is_some()
            || self.amount.is_some()
            || self.due_date.is_some()
            || self.payment_type.is_some()
            || self.frequency.is_some()
            || self.auto_pay.is_some()
    }
}

/// Input for recording money against a payment
#[derive(Debug, Clone, Deserialize)]
pub struct MarkPaid {
    /// Date of the payment
    pub paid_date: NaiveDate,
    /// Amount paid now; adds onto any earlier partial payment
    pub paid_amount: Decimal,
}

/// List filters for payments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    /// Only payments spending from this category
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Due on or after this date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Due on or before this date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Only scheduled payments whose due date has passed
    #[serde(default)]
    pub overdue_only: bool,
}

/// A payment as clients see it, with the read-time overdue facts attached
#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    /// The stored payment
    #[serde(flatten)]
    pub payment: payment::Model,
    /// Days past the due date, clamped to ≥ 0
    pub days_past_due: i64,
    /// Stored status, except `overdue` when a scheduled payment's due date
    /// has passed
    pub effective_status: PaymentStatus,
}

/// Attaches the read-time overdue facts to a payment.
#[must_use]
pub fn into_view(payment: payment::Model, today: NaiveDate) -> PaymentView {
    let days_past_due = (today - payment.due_date).num_days().max(0);
    let effective_status = if payment.status == PaymentStatus::Scheduled && payment.due_date < today
    {
        PaymentStatus::Overdue
    } else {
        payment.status
    };
    PaymentView {
        payment,
        days_past_due,
        effective_status,
    }
}

fn not_found(id: i64) -> Error {
    Error::NotFound {
        entity: "payment",
        id,
    }
}

fn validate_payee(payee: &str) -> Result<()> {
    if payee.trim().is_empty() {
        return Err(Error::Validation {
            field: "payee",
            message: "payee cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_amount(field: &'static str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation {
            field,
            message: format!("{field} must be positive, got {amount}"),
        });
    }
    Ok(())
}

/// Verifies that a spending category exists within the caller's family.
async fn check_category<C>(db: &C, ctx: &RequestContext, category_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    BudgetCategory::find_by_id(category_id)
        .filter(budget_category::Column::FamilyId.eq(ctx.family_id))
        .one(db)
        .await?
        .map(|_| ())
        .ok_or(Error::NotFound {
            entity: "budget category",
            id: category_id,
        })
}

/// Looks up a payment within the caller's family, including soft-deleted
/// rows.
pub(crate) async fn get_owned<C>(db: &C, ctx: &RequestContext, id: i64) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    Payment::find_by_id(id)
        .filter(payment::Column::FamilyId.eq(ctx.family_id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Retrieves one payment with overdue facts; cancelled payments are hidden.
///
/// # Errors
/// `NotFound` when the id is absent, cancelled, or owned by another family.
pub async fn get(db: &DatabaseConnection, ctx: &RequestContext, id: i64) -> Result<PaymentView> {
    let payment = get_owned(db, ctx, id).await?;
    if payment.status == PaymentStatus::Cancelled {
        return Err(not_found(id));
    }
    Ok(into_view(payment, Utc::now().date_naive()))
}

/// Creates a new scheduled payment.
///
/// # Errors
/// Validation errors for an empty payee or non-positive amount; `NotFound`
/// for a spending category outside the family.
pub async fn create(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    input: CreatePayment,
) -> Result<payment::Model> {
    ctx.require_editor()?;
    validate_payee(&input.payee)?;
    validate_amount("amount", input.amount)?;
    if let Some(category_id) = input.spending_category_id {
        check_category(db, ctx, category_id).await?;
    }

    let model = payment::ActiveModel {
        family_id: Set(ctx.family_id),
        payee: Set(input.payee.trim().to_string()),
        amount: Set(input.amount),
        due_date: Set(input.due_date),
        payment_type: Set(input.payment_type),
        frequency: Set(input.frequency),
        status: Set(PaymentStatus::Scheduled),
        next_due_date: Set(recurrence::next_occurrence(input.due_date, input.frequency)),
        paid_date: Set(None),
        paid_amount: Set(None),
        spending_category_id: Set(input.spending_category_id),
        auto_pay: Set(input.auto_pay),
        notes: Set(input.notes),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Applies a partial update. Once a payment is paid, only notes and the
/// spending category may change; anything else is rejected with
/// `CannotUpdatePaidPayment`.
///
/// # Errors
/// `NotFound` for absent/cancelled/foreign ids; `CannotUpdatePaidPayment`
/// for locked fields on a paid payment; validation errors on field values.
pub async fn update(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
    patch: UpdatePayment,
) -> Result<payment::Model> {
    ctx.require_editor()?;
    let existing = get_owned(db, ctx, id).await?;
    if existing.status == PaymentStatus::Cancelled {
        return Err(not_found(id));
    }
    if existing.status == PaymentStatus::Paid && patch.touches_locked_fields() {
        return Err(Error::CannotUpdatePaidPayment);
    }

    let mut active: payment::ActiveModel = existing.clone().into();

    if let Some(payee) = patch.payee {
        validate_payee(&payee)?;
        active.payee = Set(payee.trim().to_string());
    }
    if let Some(amount) = patch.amount {
        validate_amount("amount", amount)?;
        active.amount = Set(amount);
    }
    if patch.due_date.is_some() || patch.frequency.is_some() {
        let due_date = patch.due_date.unwrap_or(existing.due_date);
        let frequency = patch.frequency.unwrap_or(existing.frequency);
        active.due_date = Set(due_date);
        active.frequency = Set(frequency);
        active.next_due_date = Set(recurrence::next_occurrence(due_date, frequency));
    }
    if let Some(payment_type) = patch.payment_type {
        active.payment_type = Set(payment_type);
    }
    if let Some(category_id) = patch.spending_category_id {
        check_category(db, ctx, category_id).await?;
        active.spending_category_id = Set(Some(category_id));
    }
    if let Some(auto_pay) = patch.auto_pay {
        active.auto_pay = Set(auto_pay);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(Some(notes));
    }

    active.update(db).await.map_err(Into::into)
}

/// Records money against a payment. The paid total accumulates across
/// calls; the payment becomes `paid` once the total covers the amount due
/// and `partial` before that.
///
/// # Errors
/// `PaymentAlreadySettled` for paid/cancelled payments; validation errors
/// for a non-positive paid amount.
pub async fn mark_paid(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
    input: MarkPaid,
) -> Result<payment::Model> {
    ctx.require_editor()?;
    let existing = get_owned(db, ctx, id).await?;
    if existing.status.is_settled() {
        return Err(Error::PaymentAlreadySettled {
            status: existing.status.to_string(),
        });
    }
    validate_amount("paid_amount", input.paid_amount)?;

    let paid_total = existing.paid_amount.unwrap_or(Decimal::ZERO) + input.paid_amount;
    let target = if paid_total >= existing.amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };
    if target != existing.status && !existing.status.can_transition_to(target) {
        return Err(Error::InvalidStatusTransition {
            entity: "payment",
            from: existing.status.to_string(),
            to: target.to_string(),
        });
    }

    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(target);
    active.paid_date = Set(Some(input.paid_date));
    active.paid_amount = Set(Some(paid_total));
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a payment by cancelling it.
///
/// # Errors
/// `InvalidStatusTransition` unless the payment is still scheduled.
pub async fn cancel(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
) -> Result<payment::Model> {
    ctx.require_editor()?;
    let existing = get_owned(db, ctx, id).await?;
    if !existing.status.can_transition_to(PaymentStatus::Cancelled) {
        return Err(Error::InvalidStatusTransition {
            entity: "payment",
            from: existing.status.to_string(),
            to: PaymentStatus::Cancelled.to_string(),
        });
    }
    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(PaymentStatus::Cancelled);
    active.update(db).await.map_err(Into::into)
}

/// Lists the family's payments (cancelled excluded) with filters and offset
/// pagination, soonest due first. Each row carries its read-time overdue
/// facts.
///
/// # Errors
/// Validation error for an out-of-range page limit.
pub async fn list(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    filter: PaymentFilter,
    page: Page,
) -> Result<Paginated<PaymentView>> {
    let (limit, offset) = page.resolve()?;
    let today = Utc::now().date_naive();

    let mut query = Payment::find()
        .filter(payment::Column::FamilyId.eq(ctx.family_id))
        .filter(payment::Column::Status.ne(PaymentStatus::Cancelled));
    if let Some(category_id) = filter.category_id {
        query = query.filter(payment::Column::SpendingCategoryId.eq(category_id));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(payment::Column::DueDate.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(payment::Column::DueDate.lte(end));
    }
    if filter.overdue_only {
        query = query
            .filter(payment::Column::Status.eq(PaymentStatus::Scheduled))
            .filter(payment::Column::DueDate.lt(today));
    }

    let total = query.clone().count(db).await?;
    let data = query
        .order_by_asc(payment::Column::DueDate)
        .order_by_asc(payment::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?
        .into_iter()
        .map(|p| into_view(p, today))
        .collect();

    Ok(Paginated {
        data,
        pagination: PageInfo::new(total, limit, offset),
    })
}
