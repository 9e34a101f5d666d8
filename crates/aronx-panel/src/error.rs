use thiserror::Error;

/// Response bodies are cut to this many characters before they are kept in
/// an error.
pub const CREATE_BODY_LIMIT: usize = 400;
pub const PROBE_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel login failed: {reason}")]
    Auth { reason: String },

    /// `status` is `None` when no response arrived (timeout, refused, TLS).
    #[error("panel addClient failed (status {status:?}): {body}")]
    Create { status: Option<u16>, body: String },

    #[error("panel client removal failed: {last_error}")]
    Delete { last_error: String },

    #[error("failed to build panel HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub(crate) fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
