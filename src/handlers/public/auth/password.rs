// handlers/public/auth/password.rs - password recovery handlers

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{bearer_token, ApiJson, ApiResponse, ApiResult};
use crate::validation::{required, required_raw, validate_email, validate_password};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Recovery token from the reset link. May instead be sent as a bearer token.
    pub access_token: Option<String>,
    pub new_password: Option<String>,
}

/// POST /auth/forgot-password - Send a password reset link
///
/// The answer is the same whether or not the address has an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    let email = required("email", &payload.email)?;
    validate_email(email)?;

    let redirect_to = state.config.supabase.password_reset_redirect.as_deref();
    state.identity.request_password_reset(email, redirect_to).await?;

    Ok(ApiResponse::success(
        "Se o email estiver cadastrado, você receberá um link para redefinir a senha",
        (),
    ))
}

/// POST /auth/reset-password - Set a new password using the recovery token
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    let access_token = match payload.access_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ => bearer_token(&headers)
            .ok_or_else(|| ApiError::field("access_token", "O campo 'access_token' é obrigatório"))?,
    };
    let new_password = required_raw("new_password", &payload.new_password)?;
    validate_password("new_password", new_password)?;

    state.identity.apply_new_password(access_token, new_password).await?;

    Ok(ApiResponse::success("Senha redefinida com sucesso", ()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::testing::{call, Fixture};

    #[tokio::test]
    async fn forgot_password_passes_configured_redirect() {
        let fx = Fixture::new();
        let payload = json!({ "email": "dono@example.com" });
        let (status, _) = call(fx.app(), Method::POST, "/auth/forgot-password", None, Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            fx.identity.resets(),
            vec![("dono@example.com".to_string(), Some("http://localhost/reset".to_string()))]
        );
    }

    #[tokio::test]
    async fn forgot_password_validates_email() {
        let fx = Fixture::new();
        let (status, _) = call(fx.app(), Method::POST, "/auth/forgot-password", None, Some(json!({ "email": "nope" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(fx.identity.resets().is_empty());
    }

    #[tokio::test]
    async fn reset_password_with_token_in_body() {
        let fx = Fixture::new();
        let payload = json!({ "access_token": fx.token(&fx.owner), "new_password": "nova-senha" });
        let (status, body) = call(fx.app(), Method::POST, "/auth/reset-password", None, Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Senha redefinida com sucesso");
        assert_eq!(fx.identity.password_of("dono@example.com").as_deref(), Some("nova-senha"));
    }

    #[tokio::test]
    async fn reset_password_accepts_bearer_token() {
        let fx = Fixture::new();
        let token = fx.token(&fx.stranger);
        let (status, _) = call(fx.app(), Method::POST, "/auth/reset-password", Some(&token), Some(json!({ "new_password": "nova-senha" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fx.identity.password_of("outro@example.com").as_deref(), Some("nova-senha"));
    }

    #[tokio::test]
    async fn reset_password_rejects_short_password() {
        let fx = Fixture::new();
        let payload = json!({ "access_token": fx.token(&fx.owner), "new_password": "123" });
        let (status, body) = call(fx.app(), Method::POST, "/auth/reset-password", None, Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["new_password"].is_string());
        assert_eq!(fx.identity.password_of("dono@example.com").as_deref(), Some("senha-segura"));
    }

    #[tokio::test]
    async fn reset_password_with_unknown_token_is_unauthorized() {
        let fx = Fixture::new();
        let payload = json!({ "access_token": "token-unknown", "new_password": "nova-senha" });
        let (status, _) = call(fx.app(), Method::POST, "/auth/reset-password", None, Some(payload)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
