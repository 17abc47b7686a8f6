use axum::{
    extract::{Path, State},
    Extension,
};
use futures::future::try_join_all;

use crate::access::{AccessTarget, Principal};
use crate::app::AppState;
use crate::database::models::{Establishment, EstablishmentWithJammers};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /user/:user_id/estabelecimentos - Establishments owned by the caller
pub async fn establishments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Establishment>> {
    state.gate.authorize(&principal, AccessTarget::SelfPath(&user_id)).await?;

    let establishments = state.store.list_establishments(Some(principal.id)).await?;
    Ok(ApiResponse::list("Estabelecimentos encontrados", establishments))
}

/// GET /user/:user_id/estabelecimentos-completo - Owned establishments with their jammers
///
/// Jammer lookups for the establishments run concurrently; the response keeps
/// the establishment order of the first query.
pub async fn establishments_complete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<EstablishmentWithJammers>> {
    state.gate.authorize(&principal, AccessTarget::SelfPath(&user_id)).await?;

    let establishments = state.store.list_establishments(Some(principal.id)).await?;

    let store = &state.store;
    let jammers = try_join_all(establishments.iter().map(|e| store.list_jammers(Some(e.id)))).await?;

    let complete = establishments
        .into_iter()
        .zip(jammers)
        .map(|(establishment, jammers)| EstablishmentWithJammers::new(establishment, jammers))
        .collect();

    Ok(ApiResponse::list("Estabelecimentos encontrados", complete))
}
