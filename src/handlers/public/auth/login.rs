// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::User;
use crate::identity::Session;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::{required, required_raw};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub session: Session,
    /// The caller's `users` row, absent if sign-up never completed
    pub profile: Option<User>,
}

/// POST /auth/login - Exchange credentials for an access token
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "message": "Login realizado com sucesso",
///   "data": {
///     "access_token": "eyJhbGciOiJIUzI1NiI...",
///     "refresh_token": "...",
///     "token_type": "bearer",
///     "expires_in": 3600,
///     "user": { "id": "...", "email": "ana@example.com" },
///     "profile": { "id": "...", "email": "...", "nome": "Ana", "is_admin": false, "created_at": "..." }
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = required("email", &payload.email)?;
    let password = required_raw("password", &payload.password)?;

    let session = state.identity.sign_in(email, password).await?;
    let profile = state.store.find_user(session.user.id).await?;

    tracing::debug!("User {} signed in", session.user.id);
    Ok(ApiResponse::success(
        "Login realizado com sucesso",
        LoginResponse { session, profile },
    ))
}
