use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use aronx_provision::ProvisionError;
use aronx_types::api::ErrorResponse;

/// A provisioning failure on its way to the HTTP caller.
pub struct ApiError(pub ProvisionError);

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match &self.0 {
            ProvisionError::InviteNotFound => {
                (StatusCode::NOT_FOUND, "invite_not_found", self.0.to_string())
            }
            ProvisionError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.0.to_string())
            }
            ProvisionError::AlreadyUsed => (StatusCode::CONFLICT, "invite_used", self.0.to_string()),
            ProvisionError::DuplicateExternalId(_) => {
                (StatusCode::CONFLICT, "account_exists", self.0.to_string())
            }
            ProvisionError::ConcurrentReset(_) => (
                StatusCode::CONFLICT,
                "reset_in_progress",
                "another reset for this account finished first".to_string(),
            ),
            ProvisionError::RemoteAuth(_) => (
                StatusCode::BAD_GATEWAY,
                "panel_auth_failed",
                "VPN panel rejected the service login".to_string(),
            ),
            ProvisionError::RemoteProvision(_) => (
                StatusCode::BAD_GATEWAY,
                "panel_create_failed",
                "VPN panel did not create the client".to_string(),
            ),
            // Never echo configuration details to end users.
            ProvisionError::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_misconfigured",
                "server is misconfigured".to_string(),
            ),
            ProvisionError::CodeGenerationExhausted(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "code_generation_exhausted",
                "could not generate a unique invite code".to_string(),
            ),
            ProvisionError::Store(_) | ProvisionError::Join(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = self.parts();
        if status.is_server_error() {
            error!("{} ({}): {}", status, code, self.0);
        }

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                detail,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overtaken_reset_is_conflict() {
        let err = ApiError(ProvisionError::ConcurrentReset("tg:1".into()));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "reset_in_progress");
    }
}
