use std::sync::Arc;

use aronx_panel::HttpPanel;
use aronx_provision::Provisioner;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub provisioner: Provisioner<HttpPanel>,
    /// `None` disables the admin routes.
    pub admin_token: Option<String>,
}
