use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Guard for every protected route: resolves the bearer token and injects
/// the resulting [`Principal`](crate::access::Principal) into the request.
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state.gate.resolve(bearer_token(request.headers())).await?;

    tracing::debug!("Authenticated request from user {}", principal.id);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header. Any other scheme,
/// or a header that is not valid text, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}
