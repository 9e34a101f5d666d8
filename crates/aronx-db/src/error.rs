use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invite code not found")]
    InviteNotFound,

    #[error("invite code already used")]
    AlreadyUsed,

    #[error("no account for this external id")]
    AccountNotFound,

    #[error("an account already exists for external id {0}")]
    DuplicateExternalId(String),

    #[error("credential id {0} is already bound to an account")]
    DuplicateCredentialId(String),

    /// The account no longer holds the credential the caller read.
    #[error("account {external_id} is no longer bound to {expected}")]
    StaleCredential { external_id: String, expected: String },

    /// Every candidate collided. At the default length this points at a
    /// broken ledger rather than bad luck.
    #[error("no unique invite code after {0} attempts")]
    CodeGenerationExhausted(u32),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// True when `err` is a UNIQUE violation on `column` (`table.column`).
pub(crate) fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}
