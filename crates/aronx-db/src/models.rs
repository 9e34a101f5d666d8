/// Row types for the two local tables.
use chrono::{DateTime, Utc};
use rusqlite::Row;

/// One end user and the credential currently provisioned for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub external_id: String,
    pub display_name: Option<String>,
    pub credential_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCode {
    pub code: String,
    pub is_used: bool,
    pub used_by_external_id: Option<String>,
    pub used_by_display_name: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "external_id, display_name, credential_id, created_at";

pub(crate) const INVITE_COLUMNS: &str =
    "code, is_used, used_by_external_id, used_by_display_name, used_at, created_at";

impl UserAccount {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            external_id: row.get(0)?,
            display_name: row.get(1)?,
            credential_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl InviteCode {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            is_used: row.get(1)?,
            used_by_external_id: row.get(2)?,
            used_by_display_name: row.get(3)?,
            used_at: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
