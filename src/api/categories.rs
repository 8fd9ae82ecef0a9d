//! Budget category endpoints.

use crate::{
    api::AppState,
    core::{
        category::{self, CategoryList, CreateCategory, UpdateCategory},
        context::RequestContext,
    },
    entities::budget_category,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Query string for the category list
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    include_inactive: Option<bool>,
}

/// GET /budget-categories
pub async fn list_categories(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryList>> {
    Ok(Json(
        category::list(&state.db, &ctx, query.include_inactive.unwrap_or(false)).await?,
    ))
}

/// POST /budget-categories
pub async fn create_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateCategory>,
) -> Result<(StatusCode, Json<budget_category::Model>)> {
    let created = category::create(&state.db, &ctx, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /budget-categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateCategory>,
) -> Result<Json<budget_category::Model>> {
    Ok(Json(category::update(&state.db, &ctx, id, patch).await?))
}

/// DELETE /budget-categories/:id
pub async fn deactivate_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<budget_category::Model>> {
    Ok(Json(category::deactivate(&state.db, &ctx, id).await?))
}
