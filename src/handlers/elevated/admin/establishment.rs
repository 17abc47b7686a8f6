use axum::{
    extract::{Path, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::Principal;
use crate::app::AppState;
use crate::database::models::{Establishment, EstablishmentWithOwner, NewEstablishment};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::{parse_id, required};

#[derive(Debug, Deserialize)]
pub struct CreateEstablishmentRequest {
    pub user_id: Option<String>,
    pub nome: Option<String>,
    pub cep: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemovedEstablishment {
    #[serde(flatten)]
    pub establishment: Establishment,
    pub jammers_removidos: u64,
}

/// GET /admin/estabelecimentos - Every establishment with its owner embedded
pub async fn list_establishments(State(state): State<AppState>) -> ApiResult<Vec<EstablishmentWithOwner>> {
    let establishments = state.store.list_establishments_with_owner().await?;
    Ok(ApiResponse::list("Estabelecimentos encontrados", establishments))
}

/// POST /admin/estabelecimento - Create an establishment for an existing user
pub async fn create_establishment(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    ApiJson(payload): ApiJson<CreateEstablishmentRequest>,
) -> ApiResult<Establishment> {
    let user_id = required("user_id", &payload.user_id)?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| ApiError::field("user_id", format!("'{}' não é um identificador válido", user_id)))?;
    let nome = required("nome", &payload.nome)?;
    let cep = required("cep", &payload.cep)?;

    if state.store.find_user(user_id).await?.is_none() {
        return Err(ApiError::not_found("Usuário não encontrado"));
    }

    let establishment = state
        .store
        .insert_establishment(NewEstablishment {
            user_id,
            nome: nome.to_string(),
            cep: cep.to_string(),
        })
        .await?;

    info!("Admin {} created establishment {} for user {}", admin.id, establishment.id, user_id);
    Ok(ApiResponse::created("Estabelecimento criado com sucesso", establishment))
}

/// DELETE /admin/estabelecimento/:id - Remove an establishment and its jammers
///
/// Two independent deletes: if the second one fails the jammers are
/// already gone.
pub async fn delete_establishment(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<RemovedEstablishment> {
    let id = parse_id("id", &id)?;

    let jammers_removidos = state.store.delete_jammers_of(id).await?;
    let establishment = state
        .store
        .delete_establishment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Estabelecimento não encontrado"))?;

    info!(
        "Admin {} deleted establishment {} with {} jammer(s)",
        admin.id, id, jammers_removidos
    );
    Ok(ApiResponse::success(
        "Estabelecimento removido com sucesso",
        RemovedEstablishment {
            establishment,
            jammers_removidos,
        },
    ))
}
