use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the `jammers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Jammer {
    pub id: i64,
    pub id_estabelecimento: i64,
    pub estado_jammer: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJammer {
    pub id_estabelecimento: i64,
    pub estado_jammer: bool,
}

/// A jammer together with the user that owns its parent establishment.
///
/// `owner` is `None` when the parent establishment row is gone, which can
/// happen if a cascade delete was interrupted between its two deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct JammerOwnership {
    pub jammer: Jammer,
    pub owner: Option<Uuid>,
}
