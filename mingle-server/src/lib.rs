// Library exports for mingle-server
// This allows integration tests to drive the full router in-process

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod password;
pub mod sanitize;
pub mod session;
pub mod state;
pub mod upload;

use axum::{
    routing::{get, post},
    Router,
};

use state::AppState;

/// Build the application router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Entry page and authentication routes
        .route("/", get(api::auth::index))
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/logout", get(api::auth::logout))
        // Feed routes
        .route(
            "/stream",
            get(api::stream::get_stream).post(api::stream::create_post),
        )
        // Comment routes
        .route(
            "/comments/:post_id",
            get(api::comments::get_comments).post(api::comments::create_comment),
        )
        // Friend routes
        .route(
            "/friends",
            get(api::friends::get_friends).post(api::friends::add_friend),
        )
        // Profile routes
        .route(
            "/profile",
            get(api::profile::get_profile).post(api::profile::update_profile),
        )
        // Uploaded file serving
        .route("/uploads/:key", get(api::uploads::serve_upload))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
