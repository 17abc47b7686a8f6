use axum::extract::State;

use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::list("Usuários encontrados", users))
}
