use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised while building the connection pool
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the PostgreSQL pool behind [`PgStore`](super::PgStore).
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create the pool without opening a connection. Connections are
    /// established on first use so the server can start while the
    /// database is still coming up; `/health` reports the real state.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::validate_url(&config.url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&connection_string)?;

        info!(
            "Created database pool (max {} connections) for {}",
            config.max_connections,
            Self::redacted(&connection_string)
        );
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn validate_url(raw: &str) -> Result<String, DatabaseError> {
        if raw.trim().is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Connection string with the password stripped, for logs
    fn redacted(connection_string: &str) -> String {
        match url::Url::parse(connection_string) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}
