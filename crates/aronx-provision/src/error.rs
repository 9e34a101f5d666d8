use aronx_db::StoreError;
use aronx_link::LinkError;
use aronx_panel::PanelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("server link configuration is incomplete: {0}")]
    Configuration(#[from] LinkError),

    #[error("remote panel login failed: {0}")]
    RemoteAuth(#[source] PanelError),

    #[error("remote panel did not provision the client: {0}")]
    RemoteProvision(#[source] PanelError),

    #[error("invite code not found")]
    InviteNotFound,

    #[error("invite code already used")]
    AlreadyUsed,

    #[error("no account for this external id")]
    AccountNotFound,

    #[error("an account already exists for external id {0}")]
    DuplicateExternalId(String),

    #[error("no unique invite code after {0} attempts")]
    CodeGenerationExhausted(u32),

    /// Another reset rebound the account first; this one's credential was
    /// never stored.
    #[error("account {0} was reset concurrently")]
    ConcurrentReset(String),

    #[error("local store: {0}")]
    Store(#[source] StoreError),

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ProvisionError {
    /// Failure of login or create. Delete failures never come through here.
    pub(crate) fn from_panel(err: PanelError) -> Self {
        match err {
            PanelError::Auth { .. } => ProvisionError::RemoteAuth(err),
            _ => ProvisionError::RemoteProvision(err),
        }
    }
}

impl From<StoreError> for ProvisionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InviteNotFound => ProvisionError::InviteNotFound,
            StoreError::AlreadyUsed => ProvisionError::AlreadyUsed,
            StoreError::AccountNotFound => ProvisionError::AccountNotFound,
            StoreError::DuplicateExternalId(id) => ProvisionError::DuplicateExternalId(id),
            StoreError::CodeGenerationExhausted(n) => ProvisionError::CodeGenerationExhausted(n),
            StoreError::StaleCredential { external_id, .. } => ProvisionError::ConcurrentReset(external_id),
            other => ProvisionError::Store(other),
        }
    }
}
