//! Authentication models
//!
//! `AuthContext` is inserted into request extensions by the auth middleware
//! and extracted by handlers. A custom `FromRequestParts` impl (rather than
//! `Extension<AuthContext>`) keeps the rejection a structured JSON 401 and
//! lets handlers combine it with body extractors like `Multipart`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

/// Claims carried by the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Issued at, seconds since epoch
    pub iat: i64,
}

/// Authenticated caller identity, scoped to one tenant
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
}

impl From<&JwtClaims> for AuthContext {
    fn from(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Authentication required".to_string(),
                        details: None,
                        error_type: None,
                        code: "UNAUTHORIZED".to_string(),
                        recoverable: false,
                        suggested_action: Some("Provide a valid bearer token".to_string()),
                    }),
                )
            })
    }
}
