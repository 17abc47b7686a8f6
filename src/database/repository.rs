//! Storage port for users, establishments and jammers.
//!
//! Handlers and the access gate only see this trait, so the PostgreSQL
//! adapter can be swapped for the in-memory double in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Establishment, EstablishmentWithOwner, Jammer, JammerOwnership, NewEstablishment, NewJammer,
    NewUser, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated, e.g. a second user with the same email
    #[error("Duplicate record: {0}")]
    Conflict(String),

    /// Foreign key target missing at write time
    #[error("Referenced record missing: {0}")]
    MissingReference(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Establishments ordered by id, optionally restricted to one owner
    async fn list_establishments(&self, owner: Option<Uuid>) -> Result<Vec<Establishment>, StoreError>;

    /// Every establishment with its owner embedded
    async fn list_establishments_with_owner(&self) -> Result<Vec<EstablishmentWithOwner>, StoreError>;

    async fn find_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError>;

    async fn insert_establishment(&self, new: NewEstablishment) -> Result<Establishment, StoreError>;

    /// Deletes the row and returns it, or `None` when nothing matched
    async fn delete_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError>;

    /// Jammers ordered by id, optionally restricted to one establishment
    async fn list_jammers(&self, establishment: Option<i64>) -> Result<Vec<Jammer>, StoreError>;

    /// Jammer joined with the owner of its parent establishment
    async fn find_jammer_ownership(&self, id: i64) -> Result<Option<JammerOwnership>, StoreError>;

    async fn insert_jammer(&self, new: NewJammer) -> Result<Jammer, StoreError>;

    async fn update_jammer_state(&self, id: i64, estado_jammer: bool) -> Result<Option<Jammer>, StoreError>;

    async fn delete_jammer(&self, id: i64) -> Result<Option<Jammer>, StoreError>;

    /// Removes every jammer of an establishment, returning how many went
    async fn delete_jammers_of(&self, establishment: i64) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
