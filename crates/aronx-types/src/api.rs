use serde::{Deserialize, Serialize};

// -- Requests --
//
// The chat front-end sends everything as query parameters and calls the
// caller's identity `telegram_id`.

#[derive(Debug, Deserialize)]
pub struct UseInviteQuery {
    pub invite_code: String,
    #[serde(alias = "telegram_id")]
    pub external_id: String,
    #[serde(default, alias = "username")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentityQuery {
    #[serde(alias = "telegram_id")]
    pub external_id: String,
}

// -- Responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct UseInviteResponse {
    pub vless_link: String,
    pub credential_id: String,
    pub existing: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub vless_link: String,
    pub credential_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub vless_link: String,
    pub old_credential_id: String,
    pub new_credential_id: String,
    pub old_client_removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInviteResponse {
    pub invite_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DbHealthResponse {
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of every non-2xx response. `code` is stable and meant for
/// branching; `detail` is human readable.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub detail: String,
}
