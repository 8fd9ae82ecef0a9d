//! Payment endpoints.

use crate::{
    api::AppState,
    core::{
        context::RequestContext,
        pagination::{Page, Paginated},
        payment::{self, CreatePayment, MarkPaid, PaymentFilter, PaymentView, UpdatePayment},
    },
    entities::payment as payment_entity,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Query string for the payment list: filters plus pagination
#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    category_id: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    overdue: Option<bool>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl PaymentListQuery {
    fn into_parts(self) -> (PaymentFilter, Page) {
        (
            PaymentFilter {
                category_id: self.category_id,
                start_date: self.start_date,
                end_date: self.end_date,
                overdue_only: self.overdue.unwrap_or(false),
            },
            Page {
                limit: self.limit,
                offset: self.offset,
            },
        )
    }
}

/// GET /payments
pub async fn list_payments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Paginated<PaymentView>>> {
    let (filter, page) = query.into_parts();
    Ok(Json(payment::list(&state.db, &ctx, filter, page).await?))
}

/// GET /payments/overdue
pub async fn list_overdue_payments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Paginated<PaymentView>>> {
    let (mut filter, page) = query.into_parts();
    filter.overdue_only = true;
    Ok(Json(payment::list(&state.db, &ctx, filter, page).await?))
}

/// POST /payments
pub async fn create_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<payment_entity::Model>)> {
    let created = payment::create(&state.db, &ctx, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<PaymentView>> {
    Ok(Json(payment::get(&state.db, &ctx, id).await?))
}

/// PUT /payments/:id
pub async fn update_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(patch): Json<UpdatePayment>,
) -> Result<Json<payment_entity::Model>> {
    Ok(Json(payment::update(&state.db, &ctx, id, patch).await?))
}

/// DELETE /payments/:id
pub async fn cancel_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<payment_entity::Model>> {
    Ok(Json(payment::cancel(&state.db, &ctx, id).await?))
}

/// POST /payments/:id/mark-paid
pub async fn mark_payment_paid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(input): Json<MarkPaid>,
) -> Result<Json<payment_entity::Model>> {
    Ok(Json(payment::mark_paid(&state.db, &ctx, id, input).await?))
}
