use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::jwt::JwtKeys;
use super::repo::User;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated-user extractor.
///
/// Credential sources are tried in a fixed order: the `token` cookie first,
/// then the `Authorization: Bearer` header. Missing or invalid tokens, and
/// tokens whose subject no longer exists, all reject with 401.
pub struct AuthUser(pub User);

/// `token=<value>` from the Cookie header, if present.
fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
}

/// `Bearer <value>` from the Authorization header, if present.
fn token_from_bearer(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::to_string)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    // cookie takes precedence over the header
    let strategies = [token_from_cookie, token_from_bearer];
    strategies.iter().find_map(|extract| extract(headers))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).ok_or_else(|| {
            AppError::Unauthorized("Invalid authentication credentials".into())
        })?;

        let user = User::find_by_username(&state.db, &claims.sub)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| {
                // subject deleted after the token was issued
                warn!(subject = %claims.sub, "token subject no longer exists");
                AppError::Unauthorized("Invalid authentication credentials".into())
            })?;

        Ok(AuthUser(user))
    }
}
