use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use aronx_types::api::CreateInviteResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /admin/create-invite
pub async fn create_invite(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let invite = state.provisioner.admin_create_invite().await?;
    info!("Admin created invite {}", invite.code);

    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse {
            invite_code: invite.code,
        }),
    ))
}
