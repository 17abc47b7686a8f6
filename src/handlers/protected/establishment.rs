use axum::{
    extract::{Path, State},
    Extension,
};

use crate::access::{AccessTarget, Principal};
use crate::app::AppState;
use crate::database::models::Jammer;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::parse_id;

/// GET /estabelecimento/:id/jammers - Jammers of an establishment the caller owns
pub async fn jammers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Jammer>> {
    let id = parse_id("id", &id)?;
    state.gate.authorize(&principal, AccessTarget::Establishment(id)).await?;

    let jammers = state.store.list_jammers(Some(id)).await?;
    Ok(ApiResponse::list("Jammers encontrados", jammers))
}
