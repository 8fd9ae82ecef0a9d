//! Income event endpoints.

use crate::{
    api::AppState,
    core::{
        context::RequestContext,
        income::{
            self, BulkCreateResult, CreateIncomeEvent, IncomeFilter, MarkReceived,
            UpdateIncomeEvent,
        },
        pagination::{Page, Paginated},
    },
    entities::income_event,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Query string for the income list: filters plus pagination
#[derive(Debug, Default, Deserialize)]
pub struct IncomeListQuery {
    source: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// GET /income-events
pub async fn list_income_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<IncomeListQuery>,
) -> Result<Json<Paginated<income_event::Model>>> {
    let filter = IncomeFilter {
        source: query.source,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let page = Page {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(income::list(&state.db, &ctx, filter, page).await?))
}

/// POST /income-events
pub async fn create_income_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateIncomeEvent>,
) -> Result<(StatusCode, Json<income_event::Model>)> {
    let event = income::create(&state.db, &ctx, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /income-events/bulk
///
/// 201 when every item was created, 207 when some were rejected, 400 when
/// all of them were.
pub async fn bulk_create_income_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(items): Json<Vec<CreateIncomeEvent>>,
) -> Result<(StatusCode, Json<BulkCreateResult>)> {
    let result = income::bulk_create(&state.db, &ctx, items).await?;
    let status = if result.errors.is_empty() {
        StatusCode::CREATED
    } else if result.created.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(result)))
}

/// GET /income-events/:id
pub async fn get_income_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<income_event::Model>> {
    Ok(Json(income::get(&state.db, &ctx, id).await?))
}

/// PUT /income-events/:id
pub async fn update_income_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateIncomeEvent>,
) -> Result<Json<income_event::Model>> {
    Ok(Json(income::update(&state.db, &ctx, id, patch).await?))
}

/// DELETE /income-events/:id
pub async fn cancel_income_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<income_event::Model>> {
    Ok(Json(income::cancel(&state.db, &ctx, id).await?))
}

/// POST /income-events/:id/mark-received
pub async fn mark_income_received(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(input): Json<MarkReceived>,
) -> Result<Json<income_event::Model>> {
    Ok(Json(
        income::mark_received(&state.db, &ctx, id, input).await?,
    ))
}
