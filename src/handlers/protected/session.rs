use axum::{extract::State, Extension};
use serde::Serialize;
use uuid::Uuid;

use crate::access::Principal;
use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub profile: Option<User>,
}

/// GET /auth/verify - Confirm the bearer token and describe its owner
pub async fn verify(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<SessionInfo> {
    let profile = state.store.find_user(principal.id).await?;

    Ok(ApiResponse::success(
        "Sessão válida",
        SessionInfo {
            id: principal.id,
            email: principal.email,
            is_admin: profile.as_ref().map(|u| u.is_admin).unwrap_or(false),
            profile,
        },
    ))
}
