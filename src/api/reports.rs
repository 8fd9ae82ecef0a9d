//! Reporting endpoints.

use crate::{
    api::AppState,
    core::{
        context::RequestContext,
        report::{self, AnnualSummary, IncomeAnalysis, MonthlySummary},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;

fn missing(field: &'static str) -> Error {
    Error::Validation {
        field,
        message: format!("{field} is required"),
    }
}

/// Query string for the monthly report
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// GET /reports/monthly
pub async fn monthly_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlySummary>> {
    let year = query.year.ok_or_else(|| missing("year"))?;
    let month = query.month.ok_or_else(|| missing("month"))?;
    Ok(Json(
        report::monthly_summary(&state.db, &ctx, year, month).await?,
    ))
}

/// Query string for the annual report
#[derive(Debug, Default, Deserialize)]
pub struct AnnualQuery {
    year: Option<i32>,
}

/// GET /reports/annual
pub async fn annual_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<AnnualQuery>,
) -> Result<Json<AnnualSummary>> {
    let year = query.year.ok_or_else(|| missing("year"))?;
    Ok(Json(report::annual_summary(&state.db, &ctx, year).await?))
}

/// Query string for the income analysis report
#[derive(Debug, Default, Deserialize)]
pub struct IncomeAnalysisQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

/// GET /reports/income-analysis
pub async fn income_analysis_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<IncomeAnalysisQuery>,
) -> Result<Json<IncomeAnalysis>> {
    let start_date = query.start_date.ok_or_else(|| missing("start_date"))?;
    let end_date = query.end_date.ok_or_else(|| missing("end_date"))?;
    Ok(Json(
        report::income_analysis(&state.db, &ctx, start_date, end_date).await?,
    ))
}
