//! Identity provider port.
//!
//! Credential storage, password hashing and reset-mail delivery live in
//! the provider; the API only consumes the capabilities below.

pub mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use supabase::SupabaseAuth;

/// Stable identity issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Tokens returned by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: Identity,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("email already registered")]
    AlreadyRegistered,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token invalid, malformed or expired
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The provider refused the request for another reason
    #[error("rejected by identity provider: {0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Sends the reset link. `redirect_to` is where the link lands.
    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<(), IdentityError>;

    async fn apply_new_password(&self, access_token: &str, new_password: &str) -> Result<(), IdentityError>;

    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError>;
}
