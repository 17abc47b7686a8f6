use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::jammer::Jammer;

/// Row of the `establishment` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Establishment {
    pub id: i64,
    pub user_id: Uuid,
    pub nome: String,
    pub cep: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEstablishment {
    pub user_id: Uuid,
    pub nome: String,
    pub cep: String,
}

/// Owner columns embedded in an establishment listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub email: String,
    pub nome: String,
}

/// Establishment with its owning user embedded (single-hop join).
/// `users` is `None` when the owner row no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentWithOwner {
    #[serde(flatten)]
    pub establishment: Establishment,
    pub users: Option<OwnerSummary>,
}

/// Establishment with its jammers nested, as returned by the complete listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentWithJammers {
    #[serde(flatten)]
    pub establishment: Establishment,
    pub jammers: Vec<Jammer>,
    pub total_jammers: usize,
}

impl EstablishmentWithJammers {
    pub fn new(establishment: Establishment, jammers: Vec<Jammer>) -> Self {
        let total_jammers = jammers.len();
        Self {
            establishment,
            jammers,
            total_jammers,
        }
    }
}
