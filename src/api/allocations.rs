//! Allocation and attribution endpoints.

use crate::{
    api::AppState,
    core::{
        allocation::{self, AllocationPlan, AllocationSummary, AttributePayment},
        context::RequestContext,
    },
    entities::attribution,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET /income-events/:id/attributions
pub async fn list_attributions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(income_event_id): Path<i64>,
) -> Result<Json<Vec<attribution::Model>>> {
    Ok(Json(
        allocation::list_attributions(&state.db, &ctx, income_event_id).await?,
    ))
}

/// POST /income-events/:id/attributions
pub async fn create_attribution(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(income_event_id): Path<i64>,
    Json(input): Json<AttributePayment>,
) -> Result<(StatusCode, Json<attribution::Model>)> {
    let created = allocation::attribute_payment(&state.db, &ctx, income_event_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /attributions/:id
pub async fn delete_attribution(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    allocation::remove_attribution(&state.db, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /budget-allocations/:incomeEventId/summary
pub async fn allocation_summary(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(income_event_id): Path<i64>,
) -> Result<Json<AllocationSummary>> {
    Ok(Json(
        allocation::summary(&state.db, &ctx, income_event_id).await?,
    ))
}

/// POST /budget-allocations/:incomeEventId/allocate
pub async fn allocate_income(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(income_event_id): Path<i64>,
) -> Result<Json<AllocationPlan>> {
    Ok(Json(
        allocation::allocate(&state.db, &ctx, income_event_id).await?,
    ))
}
