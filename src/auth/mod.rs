use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Audience carried by access tokens of signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims of an access token issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.sub,
            email: self.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Verify an HS256 access token against the project secret and extract its claims.
/// Expiry and audience are both enforced.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}
