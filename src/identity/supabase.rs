//! Identity provider backed by the Supabase auth (GoTrue) REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Identity, IdentityError, IdentityProvider, Session};
use crate::auth;
use crate::config::SupabaseConfig;

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    jwt_secret: Option<String>,
}

/// User object as returned by the auth server
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: String,
    expires_in: i64,
    user: AuthUser,
}

/// Sign-up answers with a bare user, or with a session when email
/// confirmation is disabled on the project.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

/// The auth server has used several error shapes over time
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }

    fn is_already_registered(&self) -> bool {
        matches!(self.error_code.as_deref(), Some("user_already_exists" | "email_exists"))
            || self.text().to_lowercase().contains("already registered")
    }

    fn is_invalid_credentials(&self) -> bool {
        matches!(self.error_code.as_deref(), Some("invalid_credentials"))
            || matches!(self.error.as_deref(), Some("invalid_grant"))
    }
}

impl SupabaseAuth {
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        if config.url.is_empty() {
            return Err(IdentityError::Transport("SUPABASE_URL not configured".to_string()));
        }
        url::Url::parse(&config.url).map_err(|e| IdentityError::Transport(format!("invalid SUPABASE_URL: {}", e)))?;

        let client = Client::builder()
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            jwt_secret: config.jwt_secret.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_key(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, IdentityError> {
        builder.send().await.map_err(|e| {
            warn!("Identity provider request failed: {}", e);
            IdentityError::Transport(e.to_string())
        })
    }

    async fn error_body(response: Response) -> (StatusCode, ErrorBody) {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        (status, body)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IdentityError> {
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Transport(format!("unexpected response: {}", e)))
    }

    async fn resolve_remote(&self, token: &str) -> Result<Identity, IdentityError> {
        let response = Self::send(self.with_key(self.client.get(self.endpoint("user"))).bearer_auth(token)).await?;

        if response.status().is_success() {
            let user: AuthUser = Self::parse(response).await?;
            return Ok(user.into());
        }

        let (status, body) = Self::error_body(response).await;
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(IdentityError::InvalidToken(body.text()))
            }
            _ => Err(IdentityError::Transport(format!("{}: {}", status, body.text()))),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let request = self
            .with_key(self.client.post(self.endpoint("signup")))
            .json(&json!({ "email": email, "password": password }));
        let response = Self::send(request).await?;

        if response.status().is_success() {
            let user = match Self::parse::<SignUpResponse>(response).await? {
                SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
            };
            debug!("Identity provider created user {}", user.id);
            return Ok(user.into());
        }

        let (status, body) = Self::error_body(response).await;
        if body.is_already_registered() {
            return Err(IdentityError::AlreadyRegistered);
        }
        if status.is_client_error() {
            return Err(IdentityError::Rejected(body.text()));
        }
        Err(IdentityError::Transport(format!("{}: {}", status, body.text())))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let request = self
            .with_key(self.client.post(self.endpoint("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = Self::send(request).await?;

        if response.status().is_success() {
            let token: TokenResponse = Self::parse(response).await?;
            return Ok(Session {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                token_type: token.token_type,
                expires_in: token.expires_in,
                user: token.user.into(),
            });
        }

        let (status, body) = Self::error_body(response).await;
        if body.is_invalid_credentials() || status == StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidCredentials);
        }
        if status.is_client_error() {
            return Err(IdentityError::Rejected(body.text()));
        }
        Err(IdentityError::Transport(format!("{}: {}", status, body.text())))
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<(), IdentityError> {
        let mut request = self.with_key(self.client.post(self.endpoint("recover")));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let response = Self::send(request.json(&json!({ "email": email }))).await?;

        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::error_body(response).await;
        if status.is_client_error() {
            return Err(IdentityError::Rejected(body.text()));
        }
        Err(IdentityError::Transport(format!("{}: {}", status, body.text())))
    }

    async fn apply_new_password(&self, access_token: &str, new_password: &str) -> Result<(), IdentityError> {
        let request = self
            .with_key(self.client.put(self.endpoint("user")))
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }));
        let response = Self::send(request).await?;

        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::error_body(response).await;
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidToken(body.text())),
            s if s.is_client_error() => Err(IdentityError::Rejected(body.text())),
            _ => Err(IdentityError::Transport(format!("{}: {}", status, body.text()))),
        }
    }

    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        match &self.jwt_secret {
            Some(secret) => auth::verify_access_token(token, secret)
                .map(auth::Claims::into_identity)
                .map_err(|e| IdentityError::InvalidToken(e.to_string())),
            None => self.resolve_remote(token).await,
        }
    }
}
