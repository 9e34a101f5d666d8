use axum::{
    Json,
    extract::{Query, State},
};

use aronx_types::api::{UseInviteQuery, UseInviteResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /invite/use — redeem an invite, or return the caller's existing
/// link if they are already provisioned.
pub async fn use_invite(
    State(state): State<AppState>,
    Query(q): Query<UseInviteQuery>,
) -> Result<Json<UseInviteResponse>, ApiError> {
    let redeemed = state
        .provisioner
        .redeem(&q.invite_code, &q.external_id, q.display_name.as_deref())
        .await?;

    Ok(Json(UseInviteResponse {
        vless_link: redeemed.link,
        credential_id: redeemed.credential_id,
        existing: redeemed.existing,
    }))
}
