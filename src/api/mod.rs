//! HTTP interface - router assembly, shared state, and handlers.
//!
//! Every resource endpoint authenticates through the bearer-token extractor
//! in [`auth`] and delegates straight to the core stores; the handlers own
//! nothing but the HTTP-shaped edges (status codes, query strings, JSON
//! bodies).

/// Allocation and attribution endpoints
pub mod allocations;
/// Bearer-token authentication extractor
pub mod auth;
/// Budget category endpoints
pub mod categories;
/// HTTP mapping for the error taxonomy
pub mod error;
/// Income event endpoints
pub mod income;
/// Payment endpoints
pub mod payments;
/// Reporting endpoints
pub mod reports;

use crate::config::Settings;
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: Arc<DatabaseConnection>,
    /// Resolved runtime settings
    pub settings: Arc<Settings>,
}

/// Liveness probe; the only unauthenticated route.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/income-events",
            get(income::list_income_events).post(income::create_income_event),
        )
        .route("/income-events/bulk", post(income::bulk_create_income_events))
        .route(
            "/income-events/:id",
            get(income::get_income_event)
                .put(income::update_income_event)
                .delete(income::cancel_income_event),
        )
        .route(
            "/income-events/:id/mark-received",
            post(income::mark_income_received),
        )
        .route(
            "/income-events/:id/attributions",
            get(allocations::list_attributions).post(allocations::create_attribution),
        )
        .route("/attributions/:id", delete(allocations::delete_attribution))
        .route(
            "/budget-allocations/:id/summary",
            get(allocations::allocation_summary),
        )
        .route(
            "/budget-allocations/:id/allocate",
            post(allocations::allocate_income),
        )
        .route(
            "/budget-categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/budget-categories/:id",
            put(categories::update_category).delete(categories::deactivate_category),
        )
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/overdue", get(payments::list_overdue_payments))
        .route(
            "/payments/:id",
            get(payments::get_payment)
                .put(payments::update_payment)
                .delete(payments::cancel_payment),
        )
        .route("/payments/:id/mark-paid", post(payments::mark_payment_paid))
        .route("/reports/monthly", get(reports::monthly_report))
        .route("/reports/annual", get(reports::annual_report))
        .route(
            "/reports/income-analysis",
            get(reports::income_analysis_report),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::context::MemberRole;
    use crate::test_utils::setup_test_db;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret";

    async fn test_router() -> Router {
        let db = setup_test_db().await.unwrap();
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
        };
        router(AppState {
            db: Arc::new(db),
            settings: Arc::new(settings),
        })
    }

    fn token(family_id: i64, role: MemberRole) -> String {
        let claims = auth::Claims {
            sub: "user-1".to_string(),
            family_id,
            role,
            // 2100-01-01, far enough out for any test run
            exp: 4_102_444_800,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn paycheck_json() -> Value {
        json!({
            "name": "Paycheck",
            "amount": "2500.00",
            "scheduled_date": "2024-06-01",
            "frequency": "monthly",
            "source": "Acme"
        })
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = test_router().await;
        let response = app
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let app = test_router().await;
        let response = app
            .oneshot(request("GET", "/income-events", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"], "authentication_error");
    }

    #[tokio::test]
    async fn malformed_token_is_401() {
        let app = test_router().await;
        let response = app
            .oneshot(request(
                "GET",
                "/income-events",
                Some("not-a-real-token"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_secret_is_401() {
        let app = test_router().await;
        let claims = auth::Claims {
            sub: "user-1".to_string(),
            family_id: 1,
            role: MemberRole::Editor,
            exp: 4_102_444_800,
        };
        let forged = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let response = app
            .oneshot(request("GET", "/income-events", Some(&forged), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn viewer_writes_are_403() {
        let app = test_router().await;
        let viewer = token(1, MemberRole::Viewer);

        let response = app
            .oneshot(request(
                "POST",
                "/income-events",
                Some(&viewer),
                Some(paycheck_json()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn create_then_list_with_pagination_envelope() {
        let app = test_router().await;
        let editor = token(1, MemberRole::Editor);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/income-events",
                Some(&editor),
                Some(paycheck_json()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "scheduled");
        assert_eq!(created["next_occurrence"], "2024-07-01");

        let response = app
            .oneshot(request(
                "GET",
                "/income-events?limit=10&offset=0",
                Some(&editor),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["pagination"]["limit"], 10);
        assert_eq!(body["pagination"]["offset"], 0);
        assert_eq!(body["pagination"]["has_more"], false);
    }

    #[tokio::test]
    async fn cross_family_reads_are_404() {
        let app = test_router().await;
        let owner = token(1, MemberRole::Editor);
        let stranger = token(2, MemberRole::Editor);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/income-events",
                Some(&owner),
                Some(paycheck_json()),
            ))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["id"].as_i64().unwrap();

        let response = app
            .oneshot(request(
                "GET",
                &format!("/income-events/{id}"),
                Some(&stranger),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn bulk_create_mixed_is_207_with_indexed_errors() {
        let app = test_router().await;
        let editor = token(1, MemberRole::Editor);

        let items = json!([
            paycheck_json(),
            {
                "name": "",
                "amount": "100.00",
                "scheduled_date": "2024-06-01",
                "frequency": "once"
            },
            paycheck_json(),
        ]);
        let response = app
            .oneshot(request(
                "POST",
                "/income-events/bulk",
                Some(&editor),
                Some(items),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MULTI_STATUS);

        let body = body_json(response).await;
        assert_eq!(body["created"].as_array().unwrap().len(), 2);
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["index"], 1);
        assert_eq!(errors[0]["error"], "validation_error");
    }

    #[tokio::test]
    async fn paid_payment_update_maps_to_409() {
        let app = test_router().await;
        let editor = token(1, MemberRole::Editor);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/payments",
                Some(&editor),
                Some(json!({
                    "payee": "Landlord",
                    "amount": "1500.00",
                    "due_date": "2024-06-05",
                    "payment_type": "recurring",
                    "frequency": "monthly"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/payments/{id}/mark-paid"),
                Some(&editor),
                Some(json!({ "paid_date": "2024-06-05", "paid_amount": "1500.00" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/payments/{id}"),
                Some(&editor),
                Some(json!({ "amount": "999.00" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "cannot_update_paid_payment");

        // Notes stay editable
        let response = app
            .oneshot(request(
                "PUT",
                &format!("/payments/{id}"),
                Some(&editor),
                Some(json!({ "notes": "x" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_category_maps_to_409() {
        let app = test_router().await;
        let editor = token(1, MemberRole::Editor);
        let category = json!({ "name": "Needs", "target_percentage": "40" });

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/budget-categories",
                Some(&editor),
                Some(category.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request(
                "POST",
                "/budget-categories",
                Some(&editor),
                Some(category),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "duplicate_category_name");
    }
}
