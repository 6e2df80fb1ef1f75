use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiForm, AppState, LoginForm, TokenResponse};
use crate::services::Caller;

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to a [`Caller`] and attaches it
/// (and the loaded user) to the request. Every failure is a plain 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let (caller, user) = state.auth_service().resolve_caller(&token).await?;

    tracing::Span::current().record("user_id", caller.id);

    request.extensions_mut().insert::<Caller>(caller);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth_header.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
/// Form-encoded `username` (or `email`) and `password`; returns a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(ApiError::Unauthorized("empty credentials".to_string()));
    }

    let result = state
        .auth_service()
        .login(form.username.trim(), &form.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: result.access_token,
        token_type: result.token_type,
        expires_in: result.expires_in,
    }))
}
