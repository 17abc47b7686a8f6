use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::manager::DatabaseManager;
use super::models::{
    Establishment, EstablishmentWithOwner, Jammer, JammerOwnership, NewEstablishment, NewJammer,
    NewUser, OwnerSummary, User,
};
use super::repository::{Store, StoreError};

const USER_COLUMNS: &str = "id, email, nome, is_admin, created_at";
const ESTABLISHMENT_COLUMNS: &str = "id, user_id, nome, cep, created_at";
const JAMMER_COLUMNS: &str = "id, id_estabelecimento, estado_jammer, created_at";

/// [`Store`] backed by the PostgreSQL database of the managed backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps constraint violations onto the store's own variants
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.constraint().unwrap_or("unique").to_string());
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference(db.constraint().unwrap_or("foreign key").to_string());
        }
    }
    StoreError::Sqlx(err)
}

fn owner_from_row(row: &PgRow) -> Result<Option<OwnerSummary>, sqlx::Error> {
    let id: Option<Uuid> = row.try_get("owner_id")?;
    Ok(match id {
        Some(id) => Some(OwnerSummary {
            id,
            email: row.try_get("owner_email")?,
            nome: row.try_get("owner_nome")?,
        }),
        None => None,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, nome, is_admin) VALUES ($1, $2, $3, false) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.nome)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn list_establishments(&self, owner: Option<Uuid>) -> Result<Vec<Establishment>, StoreError> {
        let sql = format!(
            "SELECT {ESTABLISHMENT_COLUMNS} FROM establishment
             WHERE ($1::uuid IS NULL OR user_id = $1)
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Establishment>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_establishments_with_owner(&self) -> Result<Vec<EstablishmentWithOwner>, StoreError> {
        let rows = sqlx::query(
            "SELECT e.id, e.user_id, e.nome, e.cep, e.created_at,
                    u.id AS owner_id, u.email AS owner_email, u.nome AS owner_nome
             FROM establishment e
             LEFT JOIN users u ON u.id = e.user_id
             ORDER BY e.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let establishment = Establishment {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                nome: row.try_get("nome")?,
                cep: row.try_get("cep")?,
                created_at: row.try_get("created_at")?,
            };
            result.push(EstablishmentWithOwner {
                establishment,
                users: owner_from_row(row)?,
            });
        }
        Ok(result)
    }

    async fn find_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError> {
        let sql = format!("SELECT {ESTABLISHMENT_COLUMNS} FROM establishment WHERE id = $1");
        let row = sqlx::query_as::<_, Establishment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_establishment(&self, new: NewEstablishment) -> Result<Establishment, StoreError> {
        let sql = format!(
            "INSERT INTO establishment (user_id, nome, cep) VALUES ($1, $2, $3) RETURNING {ESTABLISHMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Establishment>(&sql)
            .bind(new.user_id)
            .bind(&new.nome)
            .bind(&new.cep)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError> {
        let sql = format!("DELETE FROM establishment WHERE id = $1 RETURNING {ESTABLISHMENT_COLUMNS}");
        sqlx::query_as::<_, Establishment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn list_jammers(&self, establishment: Option<i64>) -> Result<Vec<Jammer>, StoreError> {
        let sql = format!(
            "SELECT {JAMMER_COLUMNS} FROM jammers
             WHERE ($1::bigint IS NULL OR id_estabelecimento = $1)
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Jammer>(&sql)
            .bind(establishment)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_jammer_ownership(&self, id: i64) -> Result<Option<JammerOwnership>, StoreError> {
        let row = sqlx::query(
            "SELECT j.id, j.id_estabelecimento, j.estado_jammer, j.created_at, e.user_id AS owner
             FROM jammers j
             LEFT JOIN establishment e ON e.id = j.id_estabelecimento
             WHERE j.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(JammerOwnership {
            jammer: Jammer {
                id: row.try_get("id")?,
                id_estabelecimento: row.try_get("id_estabelecimento")?,
                estado_jammer: row.try_get("estado_jammer")?,
                created_at: row.try_get("created_at")?,
            },
            owner: row.try_get("owner")?,
        }))
    }

    async fn insert_jammer(&self, new: NewJammer) -> Result<Jammer, StoreError> {
        let sql = format!(
            "INSERT INTO jammers (id_estabelecimento, estado_jammer) VALUES ($1, $2) RETURNING {JAMMER_COLUMNS}"
        );
        sqlx::query_as::<_, Jammer>(&sql)
            .bind(new.id_estabelecimento)
            .bind(new.estado_jammer)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn update_jammer_state(&self, id: i64, estado_jammer: bool) -> Result<Option<Jammer>, StoreError> {
        let sql = format!("UPDATE jammers SET estado_jammer = $2 WHERE id = $1 RETURNING {JAMMER_COLUMNS}");
        sqlx::query_as::<_, Jammer>(&sql)
            .bind(id)
            .bind(estado_jammer)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_jammer(&self, id: i64) -> Result<Option<Jammer>, StoreError> {
        let sql = format!("DELETE FROM jammers WHERE id = $1 RETURNING {JAMMER_COLUMNS}");
        sqlx::query_as::<_, Jammer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_jammers_of(&self, establishment: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM jammers WHERE id_estabelecimento = $1")
            .bind(establishment)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
