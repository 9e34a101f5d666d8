use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::is_unique_violation;
use crate::ledger::redeem_on;
use crate::models::{InviteCode, USER_COLUMNS, UserAccount};
use crate::{Database, StoreError};

impl Database {
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserAccount>, StoreError> {
        self.with_conn(|conn| query_account(conn, external_id))
    }

    pub fn create_account(
        &self,
        external_id: &str,
        display_name: Option<&str>,
        credential_id: &str,
    ) -> Result<UserAccount, StoreError> {
        self.with_conn(|conn| insert_account(conn, external_id, display_name, credential_id))
    }

    /// Point an existing account at a new credential. Never inserts.
    ///
    /// Only applies while the row still holds `account.credential_id`; a
    /// concurrent rebind that landed first yields `StaleCredential`.
    pub fn rebind(&self, account: &UserAccount, new_credential_id: &str) -> Result<UserAccount, StoreError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET credential_id = ?3 WHERE external_id = ?1 AND credential_id = ?2",
                    params![account.external_id, account.credential_id, new_credential_id],
                )
                .map_err(|e| map_account_conflict(e, &account.external_id, new_credential_id))?;

            if changed == 0 {
                return match query_account(conn, &account.external_id)? {
                    Some(_) => Err(StoreError::StaleCredential {
                        external_id: account.external_id.clone(),
                        expected: account.credential_id.clone(),
                    }),
                    None => Err(StoreError::AccountNotFound),
                };
            }

            query_account(conn, &account.external_id)?.ok_or(StoreError::AccountNotFound)
        })
    }

    /// Consume `code` and create the account in one transaction.
    ///
    /// Either both rows change or neither does.
    pub fn provision_account(
        &self,
        code: &str,
        external_id: &str,
        display_name: Option<&str>,
        credential_id: &str,
    ) -> Result<(UserAccount, InviteCode), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let invite = redeem_on(&tx, code, external_id, display_name)?;
            let account = insert_account(&tx, external_id, display_name, credential_id)?;
            tx.commit()?;
            Ok((account, invite))
        })
    }
}

fn query_account(conn: &Connection, external_id: &str) -> Result<Option<UserAccount>, StoreError> {
    let account = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
            [external_id],
            UserAccount::from_row,
        )
        .optional()?;
    Ok(account)
}

fn insert_account(
    conn: &Connection,
    external_id: &str,
    display_name: Option<&str>,
    credential_id: &str,
) -> Result<UserAccount, StoreError> {
    conn.execute(
        "INSERT INTO users (external_id, display_name, credential_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![external_id, display_name, credential_id, Utc::now()],
    )
    .map_err(|e| map_account_conflict(e, external_id, credential_id))?;

    query_account(conn, external_id)?.ok_or(StoreError::AccountNotFound)
}

fn map_account_conflict(err: rusqlite::Error, external_id: &str, credential_id: &str) -> StoreError {
    if is_unique_violation(&err, "users.external_id") {
        StoreError::DuplicateExternalId(external_id.to_string())
    } else if is_unique_violation(&err, "users.credential_id") {
        StoreError::DuplicateCredentialId(credential_id.to_string())
    } else {
        StoreError::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_find() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_account("tg:7", Some("trinity"), "cred-a").unwrap();

        let found = db.find_by_external_id("tg:7").unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.display_name.as_deref(), Some("trinity"));
        assert!(db.find_by_external_id("tg:8").unwrap().is_none());
    }

    #[test]
    fn second_account_for_same_identity_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_account("tg:7", None, "cred-a").unwrap();

        let err = db.create_account("tg:7", None, "cred-b").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateExternalId(id) if id == "tg:7"));
    }

    #[test]
    fn credential_ids_are_unique_across_accounts() {
        let db = Database::open_in_memory().unwrap();
        db.create_account("tg:1", None, "cred-a").unwrap();

        let err = db.create_account("tg:2", None, "cred-a").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCredentialId(_)));
    }

    #[test]
    fn rebind_updates_in_place() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("tg:1", None, "cred-old").unwrap();

        let rebound = db.rebind(&account, "cred-new").unwrap();
        assert_eq!(rebound.credential_id, "cred-new");
        assert_eq!(rebound.created_at, account.created_at);

        let rows: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn rebind_from_stale_read_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("tg:1", None, "cred-old").unwrap();

        let winner = db.rebind(&account, "cred-first").unwrap();
        assert_eq!(winner.credential_id, "cred-first");

        // Second writer still holds the pre-rotation snapshot.
        let err = db.rebind(&account, "cred-second").unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleCredential { ref external_id, ref expected }
                if external_id == "tg:1" && expected == "cred-old"
        ));

        let stored = db.find_by_external_id("tg:1").unwrap().unwrap();
        assert_eq!(stored.credential_id, "cred-first");
    }

    #[test]
    fn rebind_of_missing_account_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("tg:1", None, "cred-old").unwrap();
        db.with_conn(|conn| Ok(conn.execute("DELETE FROM users", [])?)).unwrap();

        let err = db.rebind(&account, "cred-new").unwrap_err();
        assert!(matches!(err, StoreError::AccountNotFound));
    }

    #[test]
    fn provision_consumes_code_and_creates_account() {
        let db = Database::open_in_memory().unwrap();
        let code = db.create_invite().unwrap().code;

        let (account, invite) = db.provision_account(&code, "tg:1", Some("neo"), "cred-a").unwrap();
        assert_eq!(account.credential_id, "cred-a");
        assert!(invite.is_used);
        assert_eq!(invite.used_by_external_id.as_deref(), Some("tg:1"));
    }

    #[test]
    fn failed_account_insert_leaves_code_unused() {
        let db = Database::open_in_memory().unwrap();
        db.create_account("tg:1", None, "cred-a").unwrap();
        let code = db.create_invite().unwrap().code;

        let err = db.provision_account(&code, "tg:1", None, "cred-b").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateExternalId(_)));

        let invite = db.get_invite(&code).unwrap().unwrap();
        assert!(!invite.is_used);
        assert_eq!(invite.used_by_external_id, None);
    }

    #[test]
    fn used_code_creates_no_account() {
        let db = Database::open_in_memory().unwrap();
        let code = db.create_invite().unwrap().code;
        db.provision_account(&code, "tg:1", None, "cred-a").unwrap();

        let err = db.provision_account(&code, "tg:2", None, "cred-b").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyUsed));
        assert!(db.find_by_external_id("tg:2").unwrap().is_none());
    }
}
