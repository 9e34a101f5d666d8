//! Provisioning: invite redemption, link lookup and credential reset.
//!
//! Ties the local store, the remote panel and the link builder together so
//! that a caller is never told it has access the panel did not confirm.

pub mod error;
pub mod orchestrator;

pub use error::ProvisionError;
pub use orchestrator::{Lookup, Provisioner, Redemption, ResetOutcome};
