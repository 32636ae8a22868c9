use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::token::{Claims, TokenError, TokenIssuer};
use crate::error::AuthError;
use crate::state::AppState;

/// Extracts and validates a bearer token, yielding its claims. Every
/// rejection surfaces as a plain 401; the precise failure is only logged.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AuthError::Token(TokenError::Malformed)
            })?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                AuthError::Token(TokenError::Malformed)
            })?;

        let issuer = TokenIssuer::from_ref(state);
        let claims = issuer.validate(token)?;
        Ok(AuthUser(claims))
    }
}
