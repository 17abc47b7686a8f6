// handlers/public/auth/signup.rs - POST /auth/signup handler

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::database::models::{NewUser, User};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::{required, required_raw, validate_email, validate_password};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nome: Option<String>,
}

/// POST /auth/signup - Create an account and its `users` row
///
/// Expected Input:
/// ```json
/// { "email": "ana@example.com", "password": "min 6 chars", "nome": "Ana" }
/// ```
///
/// The identity provider is only called once every field is valid and the
/// email is not yet present in `users`; a rejected request creates nothing.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> ApiResult<User> {
    let email = required("email", &payload.email)?;
    let password = required_raw("password", &payload.password)?;
    validate_email(email)?;
    validate_password("password", password)?;
    let nome = required("nome", &payload.nome)?;

    if state.store.find_user_by_email(email).await?.is_some() {
        return Err(ApiError::conflict("Email já cadastrado"));
    }

    let identity = state.identity.sign_up(email, password).await?;

    let user = state
        .store
        .insert_user(NewUser {
            id: identity.id,
            email: email.to_string(),
            nome: nome.to_string(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Email já cadastrado"),
            other => other.into(),
        })?;

    info!("New user registered: {}", user.id);
    Ok(ApiResponse::created("Usuário cadastrado com sucesso", user))
}
