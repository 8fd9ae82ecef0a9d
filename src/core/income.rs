//! Income event business logic.
//!
//! Provides create, update, status transitions, listing, and bulk creation
//! for income events. Every operation takes the caller's [`RequestContext`]
//! and scopes reads and writes to its family; an id owned by another family
//! is reported as not found. The `allocated_amount`/`remaining_amount`
//! counters are only ever touched here and in the allocation engine, and the
//! invariant `allocated + remaining == (actual ?? amount)` holds after every
//! write.

use crate::{
    core::{
        context::RequestContext,
        pagination::{Page, PageInfo, Paginated},
        recurrence,
    },
    entities::{Frequency, IncomeEvent, IncomeStatus, income_event},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Input for creating one income event
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIncomeEvent {
    /// Display name
    pub name: String,
    /// Expected amount, must be positive
    pub amount: Decimal,
    /// Date the income is expected
    pub scheduled_date: NaiveDate,
    /// Repetition rule
    pub frequency: Frequency,
    /// Income source label
    #[serde(default)]
    pub source: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for an income event; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIncomeEvent {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New expected amount
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// New scheduled date
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    /// New frequency
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// New source label
    #[serde(default)]
    pub source: Option<String>,
    /// New notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for marking an income event received
#[derive(Debug, Clone, Deserialize)]
pub struct MarkReceived {
    /// Date the money arrived
    pub actual_date: NaiveDate,
    /// Amount that arrived, must be positive and cover prior attributions
    pub actual_amount: Decimal,
}

/// List filters for income events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeFilter {
    /// Exact source match
    #[serde(default)]
    pub source: Option<String>,
    /// Scheduled on or after this date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Scheduled on or before this date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// One rejected item from a bulk create, keyed by its input position
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemError {
    /// Index into the submitted array
    pub index: usize,
    /// Stable error code
    pub error: &'static str,
    /// Human-readable explanation
    pub message: String,
}

/// Outcome of a bulk create: the created subset plus per-item rejections
#[derive(Debug, Serialize)]
pub struct BulkCreateResult {
    /// Successfully created events, in submission order
    pub created: Vec<income_event::Model>,
    /// Rejected items with their input indices
    pub errors: Vec<BulkItemError>,
}

fn not_found(id: i64) -> Error {
    Error::NotFound {
        entity: "income event",
        id,
    }
}

fn validate_new(input: &CreateIncomeEvent) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "name cannot be empty".to_string(),
        });
    }
    if input.amount <= Decimal::ZERO {
        return Err(Error::Validation {
            field: "amount",
            message: format!("amount must be positive, got {}", input.amount),
        });
    }
    Ok(())
}

fn new_event(ctx: &RequestContext, input: CreateIncomeEvent) -> income_event::ActiveModel {
    income_event::ActiveModel {
        family_id: Set(ctx.family_id),
        name: Set(input.name.trim().to_string()),
        amount: Set(input.amount),
        scheduled_date: Set(input.scheduled_date),
        frequency: Set(input.frequency),
        source: Set(input.source),
        status: Set(IncomeStatus::Scheduled),
        next_occurrence: Set(recurrence::next_occurrence(
            input.scheduled_date,
            input.frequency,
        )),
        actual_date: Set(None),
        actual_amount: Set(None),
        allocated_amount: Set(Decimal::ZERO),
        remaining_amount: Set(input.amount),
        notes: Set(input.notes),
        ..Default::default()
    }
}

/// Looks up an income event within the caller's family, including soft
/// deleted rows. Used by the status transitions, which produce their own
/// errors for terminal states.
pub(crate) async fn get_owned<C>(
    db: &C,
    ctx: &RequestContext,
    id: i64,
) -> Result<income_event::Model>
where
    C: ConnectionTrait,
{
    IncomeEvent::find_by_id(id)
        .filter(income_event::Column::FamilyId.eq(ctx.family_id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Retrieves one income event; cancelled events are hidden.
///
/// # Errors
/// `NotFound` when the id is absent, cancelled, or owned by another family.
pub async fn get(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
) -> Result<income_event::Model> {
    let event = get_owned(db, ctx, id).await?;
    if event.status == IncomeStatus::Cancelled {
        return Err(not_found(id));
    }
    Ok(event)
}

/// Creates a new scheduled income event.
///
/// # Errors
/// Validation errors for an empty name or non-positive amount; `Forbidden`
/// for viewers.
pub async fn create(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    input: CreateIncomeEvent,
) -> Result<income_event::Model> {
    ctx.require_editor()?;
    validate_new(&input)?;
    new_event(ctx, input).insert(db).await.map_err(Into::into)
}

/// Applies a partial update, recomputing `next_occurrence` when the date or
/// frequency changes and `remaining_amount` when the expected amount of a
/// still-scheduled event changes.
///
/// # Errors
/// `NotFound` for absent/cancelled/foreign ids; validation errors for bad
/// field values or an amount below what is already attributed.
pub async fn update(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
    patch: UpdateIncomeEvent,
) -> Result<income_event::Model> {
    ctx.require_editor()?;
    let event = get_owned(db, ctx, id).await?;
    if event.status == IncomeStatus::Cancelled {
        return Err(not_found(id));
    }

    let mut active: income_event::ActiveModel = event.clone().into();

    if let Some(name) = patch.name {
        if name.trim().is_empty() {
            return Err(Error::Validation {
                field: "name",
                message: "name cannot be empty".to_string(),
            });
        }
        active.name = Set(name.trim().to_string());
    }

    if let Some(amount) = patch.amount {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation {
                field: "amount",
                message: format!("amount must be positive, got {amount}"),
            });
        }
        // While the event is still scheduled, attributions are measured
        // against the expected amount; shrinking it below what is already
        // attributed would drive the remainder negative.
        if event.status == IncomeStatus::Scheduled {
            let remaining = amount - event.allocated_amount;
            if remaining < Decimal::ZERO {
                return Err(Error::Validation {
                    field: "amount",
                    message: format!(
                        "amount cannot drop below the {} already attributed",
                        event.allocated_amount
                    ),
                });
            }
            active.remaining_amount = Set(remaining);
        }
        active.amount = Set(amount);
    }

    if patch.scheduled_date.is_some() || patch.frequency.is_some() {
        let scheduled_date = patch.scheduled_date.unwrap_or(event.scheduled_date);
        let frequency = patch.frequency.unwrap_or(event.frequency);
        active.scheduled_date = Set(scheduled_date);
        active.frequency = Set(frequency);
        active.next_occurrence = Set(recurrence::next_occurrence(scheduled_date, frequency));
    }

    if let Some(source) = patch.source {
        active.source = Set(Some(source));
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(Some(notes));
    }

    active.update(db).await.map_err(Into::into)
}

/// Marks an income event received, recording the actual date and amount and
/// rebasing the remaining balance on the actual amount.
///
/// # Errors
/// `InvalidStatusTransition` when the event is already received or
/// cancelled; validation errors for a non-positive actual amount or one
/// below what is already attributed.
pub async fn mark_received(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
    input: MarkReceived,
) -> Result<income_event::Model> {
    ctx.require_editor()?;
    let event = get_owned(db, ctx, id).await?;
    if !event.status.can_transition_to(IncomeStatus::Received) {
        return Err(Error::InvalidStatusTransition {
            entity: "income event",
            from: event.status.to_string(),
            to: IncomeStatus::Received.to_string(),
        });
    }
    if input.actual_amount <= Decimal::ZERO {
        return Err(Error::Validation {
            field: "actual_amount",
            message: format!("actual amount must be positive, got {}", input.actual_amount),
        });
    }
    let remaining = input.actual_amount - event.allocated_amount;
    if remaining < Decimal::ZERO {
        return Err(Error::Validation {
            field: "actual_amount",
            message: format!(
                "actual amount cannot drop below the {} already attributed",
                event.allocated_amount
            ),
        });
    }

    let mut active: income_event::ActiveModel = event.into();
    active.status = Set(IncomeStatus::Received);
    active.actual_date = Set(Some(input.actual_date));
    active.actual_amount = Set(Some(input.actual_amount));
    active.remaining_amount = Set(remaining);
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes an income event by cancelling it. Existing attributions are
/// left in place for history.
///
/// # Errors
/// `InvalidStatusTransition` for received or already-cancelled events.
pub async fn cancel(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i64,
) -> Result<income_event::Model> {
    ctx.require_editor()?;
    let event = get_owned(db, ctx, id).await?;
    if !event.status.can_transition_to(IncomeStatus::Cancelled) {
        return Err(Error::InvalidStatusTransition {
            entity: "income event",
            from: event.status.to_string(),
            to: IncomeStatus::Cancelled.to_string(),
        });
    }
    let mut active: income_event::ActiveModel = event.into();
    active.status = Set(IncomeStatus::Cancelled);
    active.update(db).await.map_err(Into::into)
}

/// Lists the family's income events (cancelled excluded), newest schedule
/// first, with filters and offset pagination.
///
/// # Errors
/// Validation error for an out-of-range page limit.
pub async fn list(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    filter: IncomeFilter,
    page: Page,
) -> Result<Paginated<income_event::Model>> {
    let (limit, offset) = page.resolve()?;

    let mut query = IncomeEvent::find()
        .filter(income_event::Column::FamilyId.eq(ctx.family_id))
        .filter(income_event::Column::Status.ne(IncomeStatus::Cancelled));
    if let Some(source) = filter.source {
        query = query.filter(income_event::Column::Source.eq(source));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(income_event::Column::ScheduledDate.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(income_event::Column::ScheduledDate.lte(end));
    }

    let total = query.clone().count(db).await?;
    let data = query
        .order_by_desc(income_event::Column::ScheduledDate)
        .order_by_desc(income_event::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?;

    Ok(Paginated {
        data,
        pagination: PageInfo::new(total, limit, offset),
    })
}

/// Creates many income events with partial-success semantics: each item is
/// validated independently, valid items are inserted, and invalid items are
/// reported with their input index. Inserts share one transaction scope, but
/// one item's validation failure never rolls back the others.
///
/// # Errors
/// `Forbidden` for viewers; database errors abort the whole batch.
pub async fn bulk_create(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    items: Vec<CreateIncomeEvent>,
) -> Result<BulkCreateResult> {
    ctx.require_editor()?;

    let txn = db.begin().await?;
    let mut created = Vec::new();
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match validate_new(&item) {
            Ok(()) => created.push(new_event(ctx, item).insert(&txn).await?),
            Err(e) => errors.push(BulkItemError {
                index,
                error: e.code(),
                message: e.to_string(),
            }),
        }
    }

    txn.commit().await?;
    Ok(BulkCreateResult { created, errors })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_invariant(event: &income_event::Model) {
        assert_eq!(
            event.allocated_amount + event.remaining_amount,
            event.effective_amount()
        );
    }

    #[tokio::test]
    async fn test_create_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let ctx = editor_ctx(1);

        let result = create(
            &db,
            &ctx,
            CreateIncomeEvent {
                name: "   ".to_string(),
                amount: dec!(100),
                scheduled_date: date(2024, 6, 1),
                frequency: Frequency::Monthly,
                source: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { field: "name", .. }
        ));

        let result = create(
            &db,
            &ctx,
            CreateIncomeEvent {
                name: "Paycheck".to_string(),
                amount: dec!(-5),
                scheduled_date: date(2024, 6, 1),
                frequency: Frequency::Monthly,
                source: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation {
                field: "amount",
                ..
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let ctx = viewer_ctx(1);

        let result = create(&db, &ctx, paycheck_input()).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;

        assert_eq!(event.family_id, 1);
        assert_eq!(event.name, "Paycheck");
        assert_eq!(event.status, IncomeStatus::Scheduled);
        assert_eq!(event.allocated_amount, Decimal::ZERO);
        assert_eq!(event.remaining_amount, dec!(2500.00));
        assert_eq!(event.next_occurrence, Some(date(2024, 7, 1)));
        assert_invariant(&event);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_frequency_recomputes_next_occurrence() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        // amount=2500.00, monthly, scheduled 2024-06-01
        let event = create(&db, &ctx, paycheck_input()).await?;

        let updated = update(
            &db,
            &ctx,
            event.id,
            UpdateIncomeEvent {
                frequency: Some(Frequency::Biweekly),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.next_occurrence, Some(date(2024, 6, 15)));
        assert_invariant(&updated);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_to_once_clears_next_occurrence() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        let updated = update(
            &db,
            &ctx,
            event.id,
            UpdateIncomeEvent {
                frequency: Some(Frequency::Once),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.next_occurrence, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_amount_rebases_remaining() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        let updated = update(
            &db,
            &ctx,
            event.id,
            UpdateIncomeEvent {
                amount: Some(dec!(3000)),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.amount, dec!(3000));
        assert_eq!(updated.remaining_amount, dec!(3000));
        assert_invariant(&updated);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_cross_family_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = editor_ctx(1);
        let stranger = editor_ctx(2);

        let event = create(&db, &owner, paycheck_input()).await?;
        let result = update(
            &db,
            &stranger,
            event.id,
            UpdateIncomeEvent {
                name: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_received_rebases_on_actual_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        let received = mark_received(
            &db,
            &ctx,
            event.id,
            MarkReceived {
                actual_date: date(2024, 6, 2),
                actual_amount: dec!(2400.00),
            },
        )
        .await?;

        assert_eq!(received.status, IncomeStatus::Received);
        assert_eq!(received.actual_date, Some(date(2024, 6, 2)));
        assert_eq!(received.actual_amount, Some(dec!(2400.00)));
        assert_eq!(received.remaining_amount, dec!(2400.00));
        assert_invariant(&received);

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_received_twice_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        let input = MarkReceived {
            actual_date: date(2024, 6, 2),
            actual_amount: dec!(2500.00),
        };
        mark_received(&db, &ctx, event.id, input.clone()).await?;

        let result = mark_received(&db, &ctx, event.id, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_hides_from_list_and_get() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        cancel(&db, &ctx, event.id).await?;

        let result = get(&db, &ctx, event.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let listed = list(&db, &ctx, IncomeFilter::default(), Page::default()).await?;
        assert_eq!(listed.pagination.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_received_event_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let event = create(&db, &ctx, paycheck_input()).await?;
        mark_received(
            &db,
            &ctx,
            event.id,
            MarkReceived {
                actual_date: date(2024, 6, 2),
                actual_amount: dec!(2500.00),
            },
        )
        .await?;

        let result = cancel(&db, &ctx, event.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        for i in 1..=3 {
            let mut input = paycheck_input();
            input.name = format!("Paycheck {i}");
            input.scheduled_date = date(2024, 6, i);
            input.source = Some("Acme".to_string());
            create(&db, &ctx, input).await?;
        }
        let mut other = paycheck_input();
        other.name = "Side gig".to_string();
        other.scheduled_date = date(2024, 7, 10);
        other.source = Some("Freelance".to_string());
        create(&db, &ctx, other).await?;

        // Source filter
        let acme = list(
            &db,
            &ctx,
            IncomeFilter {
                source: Some("Acme".to_string()),
                ..Default::default()
            },
            Page::default(),
        )
        .await?;
        assert_eq!(acme.pagination.total, 3);

        // Date range filter
        let june = list(
            &db,
            &ctx,
            IncomeFilter {
                start_date: Some(date(2024, 6, 1)),
                end_date: Some(date(2024, 6, 30)),
                ..Default::default()
            },
            Page::default(),
        )
        .await?;
        assert_eq!(june.pagination.total, 3);

        // Pagination
        let page = list(
            &db,
            &ctx,
            IncomeFilter::default(),
            Page {
                limit: Some(3),
                offset: Some(0),
            },
        )
        .await?;
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.pagination.total, 4);
        assert!(page.pagination.has_more);

        let rest = list(
            &db,
            &ctx,
            IncomeFilter::default(),
            Page {
                limit: Some(3),
                offset: Some(3),
            },
        )
        .await?;
        assert_eq!(rest.data.len(), 1);
        assert!(!rest.pagination.has_more);

        // Other families see nothing
        let stranger = list(&db, &editor_ctx(2), IncomeFilter::default(), Page::default()).await?;
        assert_eq!(stranger.pagination.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_create_partial_success() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = editor_ctx(1);

        let mut bad_amount = paycheck_input();
        bad_amount.amount = Decimal::ZERO;
        let mut bad_name = paycheck_input();
        bad_name.name = String::new();

        let items = vec![
            paycheck_input(),
            bad_amount,
            paycheck_input(),
            bad_name,
            paycheck_input(),
        ];
        let total = items.len();
        let result = bulk_create(&db, &ctx, items).await?;

        assert_eq!(result.created.len(), 3);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.created.len() + result.errors.len(), total);
        assert_eq!(result.errors[0].index, 1);
        assert_eq!(result.errors[1].index, 3);
        assert_eq!(result.errors[0].error, "validation_error");

        // The valid subset really was persisted
        let listed = list(&db, &ctx, IncomeFilter::default(), Page::default()).await?;
        assert_eq!(listed.pagination.total, 3);

        Ok(())
    }
}
