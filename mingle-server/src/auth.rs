//! Session-to-user resolution applied before handler logic runs.
//!
//! Every protected handler takes a [`CurrentUser`] argument; a request
//! without a valid session never reaches the domain layer and is redirected
//! to the entry page instead.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use mingle_types::User;

use crate::db::repositories::UserRepository;
use crate::state::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";
/// Header fallback for clients that do not send cookies
pub const SESSION_HEADER: &str = "X-Session-Token";

/// The acting authenticated user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Rejection for unauthenticated access to a protected route
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/").into_response()
    }
}

/// Pull the session token from the session cookie or the session header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthRedirect)?;
        let user_id = state
            .get_authenticated_user_id_from_token(&token)
            .ok_or(AuthRedirect)?;

        let repo = UserRepository::new(state.db.pool.clone());
        let user = repo
            .get_by_id(&user_id)
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;

        Ok(CurrentUser(user))
    }
}
