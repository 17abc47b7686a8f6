use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use tracing::info;

use crate::access::{AccessTarget, Grant, Principal, Resource};
use crate::app::AppState;
use crate::database::models::Jammer;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::parse_id;

#[derive(Debug, Deserialize)]
pub struct UpdateJammerRequest {
    pub estado_jammer: Option<bool>,
}

/// PATCH /jammer/:id - Switch a jammer on or off
///
/// Sending the current state again is not an error; the row is simply
/// written with the same value.
pub async fn update_state(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateJammerRequest>,
) -> ApiResult<Jammer> {
    let id = parse_id("id", &id)?;
    let estado_jammer = payload
        .estado_jammer
        .ok_or_else(|| ApiError::field("estado_jammer", "O campo 'estado_jammer' é obrigatório"))?;

    let grant = state.gate.authorize(&principal, AccessTarget::Jammer(id)).await?;

    let jammer = state
        .store
        .update_jammer_state(id, estado_jammer)
        .await?
        // Deleted between the ownership check and the update
        .ok_or_else(|| ApiError::not_found(format!("{} não encontrado", Resource::Jammer.label())))?;

    if grant == Grant::AdminOverride {
        info!("Admin {} set jammer {} to {}", principal.id, id, estado_jammer);
    }
    Ok(ApiResponse::success("Jammer atualizado com sucesso", jammer))
}
