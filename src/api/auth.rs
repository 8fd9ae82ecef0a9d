//! Bearer-token authentication.
//!
//! [`RequestContext`] doubles as an axum extractor: any handler that takes
//! one only runs once the `Authorization: Bearer <JWT>` header has been
//! verified against the configured secret and its claims lifted out. Token
//! issuance lives elsewhere; this service only verifies.

use crate::{
    api::AppState,
    core::context::{MemberRole, RequestContext},
    errors::Error,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user id
    pub sub: String,
    /// Family the token grants access to
    pub family_id: i64,
    /// Role within the family
    pub role: MemberRole,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

fn unauthorized(message: &str) -> Error {
    Error::Authentication {
        message: message.to_string(),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("missing bearer token"))?;
        let token = header_value
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| unauthorized("authorization header is not a bearer token"))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| unauthorized(&format!("invalid token: {e}")))?;

        Ok(Self {
            family_id: data.claims.family_id,
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}
