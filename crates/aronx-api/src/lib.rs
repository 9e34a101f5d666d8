pub mod accounts;
pub mod admin;
pub mod error;
pub mod health;
pub mod invites;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// All routes the bot and admin tooling call.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/create-invite", post(admin::create_invite))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin));

    Router::new()
        .route("/", get(health::root))
        .route("/health/db", get(health::database))
        .route("/invite/use", post(invites::use_invite))
        .route("/me", get(accounts::me))
        .route("/me/reset", post(accounts::reset))
        .merge(admin_routes)
        .with_state(state)
}
