use std::sync::Arc;

use aronx_db::ledger::normalize_code;
use aronx_db::{Database, InviteCode, StoreError, UserAccount};
use aronx_link::{LinkConfig, build_link};
use aronx_panel::{PanelSession, RemotePanel};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::ProvisionError;

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub link: String,
    pub credential_id: String,
    /// The identity was already provisioned; no code was consumed.
    pub existing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    pub link: String,
    pub credential_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetOutcome {
    pub link: String,
    pub old_credential_id: String,
    pub new_credential_id: String,
    /// False when the old panel client could not be removed and was left
    /// behind on the panel.
    pub old_client_removed: bool,
}

/// Coordinates the store, the panel and the link builder.
pub struct Provisioner<P: RemotePanel> {
    db: Arc<Database>,
    panel: P,
    link: LinkConfig,
}

impl<P: RemotePanel> Provisioner<P> {
    /// Rejects an incomplete link config up front, before any user can be
    /// provisioned without a usable link.
    pub fn new(db: Arc<Database>, panel: P, link: LinkConfig) -> Result<Self, ProvisionError> {
        link.validate()?;
        Ok(Self { db, panel, link })
    }

    /// Redeem an invite for `external_id`.
    ///
    /// An already provisioned identity gets its current link back and the
    /// code is left untouched. Otherwise the panel client is created first
    /// and only then are the account and the code committed, together.
    pub async fn redeem(
        &self,
        code: &str,
        external_id: &str,
        display_name: Option<&str>,
    ) -> Result<Redemption, ProvisionError> {
        if let Some(account) = self.find(external_id).await? {
            debug!("{} already provisioned, returning existing link", external_id);
            return self.redemption(account, true);
        }

        let code = normalize_code(code);
        {
            let code = code.clone();
            self.blocking(move |db| db.check_invite(&code)).await?;
        }

        let credential_id = Uuid::new_v4().to_string();
        let session = self
            .panel
            .authenticate()
            .await
            .map_err(ProvisionError::from_panel)?;
        session
            .create_client(&credential_id)
            .await
            .map_err(ProvisionError::from_panel)?;

        let committed = {
            let external_id = external_id.to_string();
            let display_name = display_name.map(str::to_string);
            let credential_id = credential_id.clone();
            self.blocking(move |db| {
                db.provision_account(&code, &external_id, display_name.as_deref(), &credential_id)
            })
            .await
        };

        match committed {
            Ok((account, _)) => {
                info!("Provisioned {} with credential {}", account.external_id, account.credential_id);
                self.redemption(account, false)
            }
            Err(err) => {
                error!(
                    "Panel client {} created but local commit for {} failed: {}",
                    credential_id, external_id, err
                );
                self.discard_orphan(&session, &credential_id).await;

                // A concurrent redemption for the same identity won the race.
                if let ProvisionError::DuplicateExternalId(_) = err {
                    if let Some(account) = self.find(external_id).await? {
                        return self.redemption(account, true);
                    }
                }
                Err(err)
            }
        }
    }

    /// Current link for `external_id`. Touches only the local store.
    pub async fn lookup(&self, external_id: &str) -> Result<Lookup, ProvisionError> {
        let account = self
            .find(external_id)
            .await?
            .ok_or(ProvisionError::AccountNotFound)?;

        Ok(Lookup {
            link: build_link(&account.credential_id, &self.link)?,
            credential_id: account.credential_id,
        })
    }

    /// Replace the credential of an existing account.
    ///
    /// Removing the old panel client is best effort. Creating the new one is
    /// not: if it fails, the account keeps pointing at the old credential.
    /// When the old client was already removed at that point the user has
    /// no working client until it is re-created on the panel by hand.
    ///
    /// Of two overlapping resets only the first to rebind wins; the other
    /// removes its own new client and fails with `ConcurrentReset`.
    pub async fn reset(&self, external_id: &str) -> Result<ResetOutcome, ProvisionError> {
        let account = self
            .find(external_id)
            .await?
            .ok_or(ProvisionError::AccountNotFound)?;
        let old_credential_id = account.credential_id.clone();
        let new_credential_id = Uuid::new_v4().to_string();

        let session = self
            .panel
            .authenticate()
            .await
            .map_err(ProvisionError::from_panel)?;

        let old_client_removed = match session.delete_client(&old_credential_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Old panel client {} for {} not removed, continuing reset: {}",
                    old_credential_id, external_id, e
                );
                false
            }
        };

        if let Err(e) = session.create_client(&new_credential_id).await {
            error!(
                "Reset for {} aborted, panel refused new client (old client removed: {}): {}",
                external_id, old_client_removed, e
            );
            return Err(ProvisionError::from_panel(e));
        }

        let rebound = {
            let new_credential_id = new_credential_id.clone();
            self.blocking(move |db| db.rebind(&account, &new_credential_id))
                .await
        };

        let account = match rebound {
            Ok(account) => account,
            Err(err @ ProvisionError::ConcurrentReset(_)) => {
                error!(
                    "Panel client {} created but {} was rebound by another reset first",
                    new_credential_id, external_id
                );
                self.discard_orphan(&session, &new_credential_id).await;
                return Err(err);
            }
            Err(err) => {
                error!(
                    "Panel client {} created but rebinding {} failed, needs manual reconciliation: {}",
                    new_credential_id, external_id, err
                );
                return Err(err);
            }
        };

        info!(
            "Reset {}: {} -> {}",
            external_id, old_credential_id, account.credential_id
        );
        Ok(ResetOutcome {
            link: build_link(&account.credential_id, &self.link)?,
            old_credential_id,
            new_credential_id: account.credential_id,
            old_client_removed,
        })
    }

    /// Mint a new invite code.
    pub async fn admin_create_invite(&self) -> Result<InviteCode, ProvisionError> {
        self.blocking(|db| db.create_invite()).await
    }

    pub async fn check_store(&self) -> Result<(), ProvisionError> {
        self.blocking(|db| db.ping()).await
    }

    async fn find(&self, external_id: &str) -> Result<Option<UserAccount>, ProvisionError> {
        let external_id = external_id.to_string();
        self.blocking(move |db| db.find_by_external_id(&external_id))
            .await
    }

    fn redemption(&self, account: UserAccount, existing: bool) -> Result<Redemption, ProvisionError> {
        Ok(Redemption {
            link: build_link(&account.credential_id, &self.link)?,
            credential_id: account.credential_id,
            existing,
        })
    }

    /// Remove a panel client that has no local account. The outcome is
    /// only logged.
    async fn discard_orphan(&self, session: &P::Session, credential_id: &str) {
        match session.delete_client(credential_id).await {
            Ok(()) => warn!("Orphaned panel client {} removed", credential_id),
            Err(e) => error!(
                "Orphaned panel client {} left on panel, remove it manually: {}",
                credential_id, e
            ),
        }
    }

    /// Run a store call off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T, ProvisionError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        Ok(tokio::task::spawn_blocking(move || f(&db)).await??)
    }
}
