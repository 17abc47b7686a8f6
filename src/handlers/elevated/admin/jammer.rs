use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use tracing::info;

use crate::access::Principal;
use crate::app::AppState;
use crate::database::models::{Jammer, NewJammer};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::parse_id;

#[derive(Debug, Deserialize)]
pub struct CreateJammerRequest {
    pub id_estabelecimento: Option<i64>,
    #[serde(default)]
    pub estado_jammer: bool,
}

/// GET /admin/jammers
pub async fn list_jammers(State(state): State<AppState>) -> ApiResult<Vec<Jammer>> {
    let jammers = state.store.list_jammers(None).await?;
    Ok(ApiResponse::list("Jammers encontrados", jammers))
}

/// POST /admin/jammer - Attach a new jammer to an existing establishment
pub async fn create_jammer(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    ApiJson(payload): ApiJson<CreateJammerRequest>,
) -> ApiResult<Jammer> {
    let id_estabelecimento = payload
        .id_estabelecimento
        .ok_or_else(|| ApiError::field("id_estabelecimento", "O campo 'id_estabelecimento' é obrigatório"))?;

    if state.store.find_establishment(id_estabelecimento).await?.is_none() {
        return Err(ApiError::not_found("Estabelecimento não encontrado"));
    }

    let jammer = state
        .store
        .insert_jammer(NewJammer {
            id_estabelecimento,
            estado_jammer: payload.estado_jammer,
        })
        .await?;

    info!("Admin {} created jammer {} in establishment {}", admin.id, jammer.id, id_estabelecimento);
    Ok(ApiResponse::created("Jammer criado com sucesso", jammer))
}

/// DELETE /admin/jammer/:id
pub async fn delete_jammer(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Jammer> {
    let id = parse_id("id", &id)?;

    let jammer = state
        .store
        .delete_jammer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Jammer não encontrado"))?;

    info!("Admin {} deleted jammer {}", admin.id, id);
    Ok(ApiResponse::success("Jammer removido com sucesso", jammer))
}
