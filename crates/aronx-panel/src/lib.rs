/// Client for the 3x-ui style proxy panel that owns the inbound's client list.
///
/// Every logical operation logs in first and works through the returned
/// session; sessions are not shared between unrelated operations.

pub mod candidates;
pub mod client;
pub mod config;
pub mod error;

use std::future::Future;

pub use client::{HttpPanel, HttpSession};
pub use config::PanelConfig;
pub use error::PanelError;

/// Entry point to the remote panel.
pub trait RemotePanel: Send + Sync {
    type Session: PanelSession;

    /// Log in and return a session scoped to one operation sequence.
    fn authenticate(&self) -> impl Future<Output = Result<Self::Session, PanelError>> + Send;
}

/// Authenticated create/delete commands against the inbound.
pub trait PanelSession: Send + Sync {
    /// Add a client whose id is `credential_id`. No fallbacks.
    fn create_client(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<(), PanelError>> + Send;

    /// Remove a client, probing the known delete endpoint shapes in order.
    fn delete_client(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<(), PanelError>> + Send;
}
