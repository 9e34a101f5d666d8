use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::error::is_unique_violation;
use crate::models::{INVITE_COLUMNS, InviteCode};
use crate::{Database, StoreError};

pub const DEFAULT_CODE_LENGTH: usize = 10;
pub const DEFAULT_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Shape of generated invite codes.
#[derive(Debug, Clone)]
pub struct CodeSpec {
    pub length: usize,
    pub alphabet: &'static [u8],
    pub max_attempts: u32,
}

impl Default for CodeSpec {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            alphabet: DEFAULT_CODE_ALPHABET,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CodeSpec {
    pub fn random_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())] as char)
            .collect()
    }
}

/// Normalize a code typed by a person: drop whitespace, upper-case.
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

impl Database {
    /// Generate a fresh code and store it as unused.
    ///
    /// Uniqueness is decided by the UNIQUE index at insert time, so two
    /// concurrent generators can never both keep the same code.
    pub fn generate_unique_code(&self, spec: &CodeSpec) -> Result<InviteCode, StoreError> {
        self.generate_unique_code_with(spec.max_attempts, || spec.random_code())
    }

    pub(crate) fn generate_unique_code_with<G>(
        &self,
        max_attempts: u32,
        mut next_candidate: G,
    ) -> Result<InviteCode, StoreError>
    where
        G: FnMut() -> String,
    {
        for attempt in 1..=max_attempts {
            let code = next_candidate();
            let inserted = self.with_conn(|conn| insert_invite(conn, &code));
            match inserted {
                Ok(invite) => {
                    info!("Invite code {} created", invite.code);
                    return Ok(invite);
                }
                Err(StoreError::Sqlite(e)) if is_unique_violation(&e, "invite_codes.code") => {
                    warn!("Invite code collision on attempt {}/{}", attempt, max_attempts);
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::CodeGenerationExhausted(max_attempts))
    }

    /// Admin action: mint one invite with the default code shape.
    pub fn create_invite(&self) -> Result<InviteCode, StoreError> {
        self.generate_unique_code(&CodeSpec::default())
    }

    pub fn get_invite(&self, code: &str) -> Result<Option<InviteCode>, StoreError> {
        self.with_conn(|conn| query_invite(conn, code))
    }

    /// Check that `code` exists and is still unused, without consuming it.
    pub fn check_invite(&self, code: &str) -> Result<InviteCode, StoreError> {
        match self.get_invite(code)? {
            None => Err(StoreError::InviteNotFound),
            Some(invite) if invite.is_used => Err(StoreError::AlreadyUsed),
            Some(invite) => Ok(invite),
        }
    }

    /// Consume `code` on its own. Account creation normally goes through
    /// `provision_account`, which does this inside the same transaction.
    pub fn redeem_invite(
        &self,
        code: &str,
        external_id: &str,
        display_name: Option<&str>,
    ) -> Result<InviteCode, StoreError> {
        self.with_conn(|conn| redeem_on(conn, code, external_id, display_name))
    }
}

fn insert_invite(conn: &Connection, code: &str) -> Result<InviteCode, StoreError> {
    conn.execute(
        "INSERT INTO invite_codes (code, is_used, created_at) VALUES (?1, 0, ?2)",
        params![code, Utc::now()],
    )?;
    query_invite(conn, code)?.ok_or(StoreError::InviteNotFound)
}

pub(crate) fn query_invite(conn: &Connection, code: &str) -> Result<Option<InviteCode>, StoreError> {
    let invite = conn
        .query_row(
            &format!("SELECT {INVITE_COLUMNS} FROM invite_codes WHERE code = ?1"),
            [code],
            InviteCode::from_row,
        )
        .optional()?;
    Ok(invite)
}

/// Mark `code` used by `external_id`.
///
/// The conditional update is the compare-and-swap: of two racing callers
/// only one sees a changed row.
pub(crate) fn redeem_on(
    conn: &Connection,
    code: &str,
    external_id: &str,
    display_name: Option<&str>,
) -> Result<InviteCode, StoreError> {
    let changed = conn.execute(
        "UPDATE invite_codes
         SET is_used = 1, used_by_external_id = ?2, used_by_display_name = ?3, used_at = ?4
         WHERE code = ?1 AND is_used = 0",
        params![code, external_id, display_name, Utc::now()],
    )?;

    if changed == 0 {
        return Err(match query_invite(conn, code)? {
            Some(_) => StoreError::AlreadyUsed,
            None => StoreError::InviteNotFound,
        });
    }

    query_invite(conn, code)?.ok_or(StoreError::InviteNotFound)
}
