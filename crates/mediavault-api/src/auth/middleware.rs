//! Bearer token authentication middleware
//!
//! Validates an HS256 JWT from the `Authorization` header and inserts an
//! [`AuthContext`] into the request extensions for handlers to extract.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

use crate::auth::models::{AuthContext, JwtClaims};
use crate::error::ErrorResponse;

/// Shared state for the auth middleware
pub struct AuthState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
            error_type: None,
            code: "UNAUTHORIZED".to_string(),
            recoverable: false,
            suggested_action: Some("Provide a valid bearer token".to_string()),
        }),
    )
        .into_response()
}

/// Axum middleware: authenticate the request or reject with a JSON 401
pub async fn auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => return unauthorized("Missing bearer token"),
    };

    let claims = match decode::<JwtClaims>(token, &auth.decoding_key, &auth.validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Token validation failed");
            return unauthorized("Invalid or expired token");
        }
    };

    let context = AuthContext::from(&claims);
    tracing::Span::current().record("tenant_id", tracing::field::display(context.tenant_id));
    request.extensions_mut().insert(context);

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn make_token(secret: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: UserRole::Member,
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_decodes() {
        let auth = AuthState::new("test-secret");
        let token = make_token("test-secret", 3600);
        let decoded = decode::<JwtClaims>(&token, &auth.decoding_key, &auth.validation);
        assert!(decoded.is_ok());
    }

    #[test]
    fn wrong_secret_rejected() {
        let auth = AuthState::new("other-secret");
        let token = make_token("test-secret", 3600);
        let decoded = decode::<JwtClaims>(&token, &auth.decoding_key, &auth.validation);
        assert!(decoded.is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let auth = AuthState::new("test-secret");
        let token = make_token("test-secret", -3600);
        let decoded = decode::<JwtClaims>(&token, &auth.decoding_key, &auth.validation);
        assert!(decoded.is_err());
    }
}
