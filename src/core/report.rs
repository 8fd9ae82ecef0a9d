//! Report generation business logic.
//!
//! Read-only rollups over the income and payment stores for presentation.
//! All statistics are computed in memory from the family's rows; nothing
//! here writes.

use crate::{
    core::context::RequestContext,
    entities::{
        IncomeEvent, IncomeStatus, Payment, PaymentStatus, income_event, payment,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// One month's income and payment totals
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Expected income scheduled in the month
    pub income_scheduled: Decimal,
    /// Income actually received in the month
    pub income_received: Decimal,
    /// Number of income events in the month
    pub income_count: usize,
    /// Payment amounts due in the month
    pub payments_due: Decimal,
    /// Amounts actually paid against those payments
    pub payments_paid: Decimal,
    /// Number of payments due in the month
    pub payment_count: usize,
    /// Scheduled payments in the month already past due
    pub overdue_count: usize,
    /// `income_received - payments_paid`
    pub net_cash_flow: Decimal,
}

/// Twelve monthly summaries plus year totals
#[derive(Debug, Serialize)]
pub struct AnnualSummary {
    /// Calendar year
    pub year: i32,
    /// One entry per month, January first
    pub months: Vec<MonthlySummary>,
    /// Year total of scheduled income
    pub income_scheduled: Decimal,
    /// Year total of received income
    pub income_received: Decimal,
    /// Year total of amounts due
    pub payments_due: Decimal,
    /// Year total of amounts paid
    pub payments_paid: Decimal,
    /// Year total of `income_received - payments_paid`
    pub net_cash_flow: Decimal,
}

/// Per-source income statistics over a date range
#[derive(Debug, Clone, Serialize)]
pub struct SourceAnalysis {
    /// Source label; events without one group under "unknown"
    pub source: String,
    /// Events scheduled from this source
    pub event_count: usize,
    /// How many of them were received
    pub received_count: usize,
    /// Sum of expected amounts
    pub scheduled_total: Decimal,
    /// Sum of actually received amounts
    pub received_total: Decimal,
    /// Mean expected amount, rounded to cents
    pub average_amount: Decimal,
    /// `received_count / event_count`, as a percentage
    pub reliability_percentage: Decimal,
}

/// Income analysis over a date range, grouped by source
#[derive(Debug, Serialize)]
pub struct IncomeAnalysis {
    /// Range start (inclusive)
    pub start_date: NaiveDate,
    /// Range end (inclusive)
    pub end_date: NaiveDate,
    /// Per-source statistics, largest scheduled total first
    pub sources: Vec<SourceAnalysis>,
    /// Range total of expected amounts
    pub total_scheduled: Decimal,
    /// Range total of received amounts
    pub total_received: Decimal,
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(Error::Validation {
        field: "month",
        message: format!("{year}-{month} is not a calendar month"),
    })
}

fn summarize(
    year: i32,
    month: u32,
    incomes: &[income_event::Model],
    payments: &[payment::Model],
    today: NaiveDate,
) -> MonthlySummary {
    let income_scheduled = incomes.iter().map(|e| e.amount).sum();
    let income_received = incomes
        .iter()
        .filter(|e| e.status == IncomeStatus::Received)
        .filter_map(|e| e.actual_amount)
        .sum();
    let payments_due = payments.iter().map(|p| p.amount).sum();
    let payments_paid: Decimal = payments.iter().filter_map(|p| p.paid_amount).sum();
    let overdue_count = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Scheduled && p.due_date < today)
        .count();

    MonthlySummary {
        year,
        month,
        income_scheduled,
        income_received,
        income_count: incomes.len(),
        payments_due,
        payments_paid,
        payment_count: payments.len(),
        overdue_count,
        net_cash_flow: income_received - payments_paid,
    }
}

async fn load_range(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Result<(Vec<income_event::Model>, Vec<payment::Model>)> {
    let incomes = IncomeEvent::find()
        .filter(income_event::Column::FamilyId.eq(ctx.family_id))
        .filter(income_event::Column::Status.ne(IncomeStatus::Cancelled))
        .filter(income_event::Column::ScheduledDate.gte(start))
        .filter(income_event::Column::ScheduledDate.lt(end_exclusive))
        .all(db)
        .await?;
    let payments = Payment::find()
        .filter(payment::Column::FamilyId.eq(ctx.family_id))
        .filter(payment::Column::Status.ne(PaymentStatus::Cancelled))
        .filter(payment::Column::DueDate.gte(start))
        .filter(payment::Column::DueDate.lt(end_exclusive))
        .all(db)
        .await?;
    Ok((incomes, payments))
}

/// Builds the income/payment rollup for one calendar month.
///
/// # Errors
/// Validation error for an impossible year/month pair.
pub async fn monthly_summary(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    year: i32,
    month: u32,
) -> Result<MonthlySummary> {
    let start = month_start(year, month)?;
    let end_exclusive = start
        .checked_add_months(Months::new(1))
        .ok_or(Error::Validation {
            field: "year",
            message: format!("{year} is out of range"),
        })?;

    let (incomes, payments) = load_range(db, ctx, start, end_exclusive).await?;
    Ok(summarize(
        year,
        month,
        &incomes,
        &payments,
        Utc::now().date_naive(),
    ))
}

/// Builds twelve monthly rollups and the year totals in one pass.
///
/// # Errors
/// Validation error for an out-of-range year.
pub async fn annual_summary(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    year: i32,
) -> Result<AnnualSummary> {
    let start = month_start(year, 1)?;
    let end_exclusive = month_start(year + 1, 1)?;
    let today = Utc::now().date_naive();

    let (incomes, payments) = load_range(db, ctx, start, end_exclusive).await?;

    let months: Vec<MonthlySummary> = (1..=12)
        .map(|month| {
            let month_incomes: Vec<_> = incomes
                .iter()
                .filter(|e| e.scheduled_date.month() == month)
                .cloned()
                .collect();
            let month_payments: Vec<_> = payments
                .iter()
                .filter(|p| p.due_date.month() == month)
                .cloned()
                .collect();
            summarize(year, month, &month_incomes, &month_payments, today)
        })
        .collect();

    Ok(AnnualSummary {
        year,
        income_scheduled: months.iter().map(|m| m.income_scheduled).sum(),
        income_received: months.iter().map(|m| m.income_received).sum(),
        payments_due: months.iter().map(|m| m.payments_due).sum(),
        payments_paid: months.iter().map(|m| m.payments_paid).sum(),
        net_cash_flow: months.iter().map(|m| m.net_cash_flow).sum(),
        months,
    })
}

/// Groups the range's income events by source and computes per-source
/// totals, averages, and the received-vs-scheduled rate.
///
/// # Errors
/// Validation error when the range is inverted.
pub async fn income_analysis(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<IncomeAnalysis> {
    if end_date < start_date {
        return Err(Error::Validation {
            field: "end_date",
            message: "end date is before start date".to_string(),
        });
    }

    let incomes = IncomeEvent::find()
        .filter(income_event::Column::FamilyId.eq(ctx.family_id))
        .filter(income_event::Column::Status.ne(IncomeStatus::Cancelled))
        .filter(income_event::Column::ScheduledDate.gte(start_date))
        .filter(income_event::Column::ScheduledDate.lte(end_date))
        .all(db)
        .await?;

    let mut by_source: BTreeMap<String, Vec<&income_event::Model>> = BTreeMap::new();
    for event in &incomes {
        by_source
            .entry(
                event
                    .source
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            )
            .or_default()
            .push(event);
    }

    let mut sources: Vec<SourceAnalysis> = by_source
        .into_iter()
        .map(|(source, events)| {
            let event_count = events.len();
            let received_count = events
                .iter()
                .filter(|e| e.status == IncomeStatus::Received)
                .count();
            let scheduled_total: Decimal = events.iter().map(|e| e.amount).sum();
            let received_total: Decimal =
                events.iter().filter_map(|e| e.actual_amount).sum();
            let average_amount = round_cents(scheduled_total / Decimal::from(event_count as u64));
            let reliability_percentage = round_cents(
                Decimal::from(received_count as u64) / Decimal::from(event_count as u64)
                    * Decimal::ONE_HUNDRED,
            );
            SourceAnalysis {
                source,
                event_count,
                received_count,
                scheduled_total,
                received_total,
                average_amount,
                reliability_percentage,
            }
        })
        .collect();
    sources.sort_by(|a, b| b.scheduled_total.cmp(&a.scheduled_total));

    Ok(IncomeAnalysis {
        start_date,
        end_date,
        total_scheduled: sources.iter().map(|s| s.scheduled_total).sum(),
        total_received: sources.iter().map(|s| s.received_total).sum(),
        sources,
    })
}
