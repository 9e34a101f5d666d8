use axum::{
    Json,
    extract::{Query, State},
};

use aronx_types::api::{IdentityQuery, MeResponse, ResetResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    Query(q): Query<IdentityQuery>,
) -> Result<Json<MeResponse>, ApiError> {
    let found = state.provisioner.lookup(&q.external_id).await?;

    Ok(Json(MeResponse {
        vless_link: found.link,
        credential_id: found.credential_id,
    }))
}

/// POST /me/reset — issue a new credential and drop the old one.
pub async fn reset(
    State(state): State<AppState>,
    Query(q): Query<IdentityQuery>,
) -> Result<Json<ResetResponse>, ApiError> {
    let outcome = state.provisioner.reset(&q.external_id).await?;

    Ok(Json(ResetResponse {
        vless_link: outcome.link,
        old_credential_id: outcome.old_credential_id,
        new_credential_id: outcome.new_credential_id,
        old_client_removed: outcome.old_client_removed,
    }))
}
