use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::access::{AccessTarget, Principal};
use crate::app::AppState;
use crate::error::ApiError;

/// Guard for `/admin/*`. Must run after [`require_authenticated`](super::require_authenticated),
/// which supplies the principal.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.gate.authorize(&principal, AccessTarget::Admin).await?;
    Ok(next.run(request).await)
}
