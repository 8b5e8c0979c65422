use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use mingle_types::{LoginRequest, LoginResponse, Profile, RegisterRequest, User};

use super::{ApiError, ApiResult};
use crate::auth::{self, CurrentUser, SESSION_COOKIE};
use crate::db::{self, repositories::UserRepository};
use crate::password;
use crate::sanitize;
use crate::state::AppState;

/// Identical for unknown usernames and wrong passwords, so a failed login
/// reveals nothing about which accounts exist.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

const NAME_MAX_LEN: usize = 50;
const PASSWORD_MIN_LEN: usize = 4;

/// GET / - entry page anchor; login and register both live here in the
/// presentation layer, and unauthenticated requests are redirected here
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Log in at /login or create an account at /register"
    }))
}

/// POST /register - Create a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let username = sanitize::clean(&payload.username);
    let first_name = sanitize::clean(&payload.first_name);
    let last_name = sanitize::clean(&payload.last_name);

    for (field, value) in [
        ("username", &username),
        ("first_name", &first_name),
        ("last_name", &last_name),
    ] {
        if value.is_empty() || value.len() > NAME_MAX_LEN {
            return Err(ApiError::Validation(format!(
                "{field} must be between 1 and {NAME_MAX_LEN} characters"
            )));
        }
    }
    if payload.password.len() < PASSWORD_MIN_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }

    let password_hash = password::hash(&payload.password)?;

    let user = User {
        id: Uuid::new_v4(),
        username,
        first_name,
        last_name,
        created_at: Utc::now(),
        profile: Profile::default(),
    };

    // The UNIQUE constraint on username arbitrates racing registrations:
    // exactly one insert wins, the other surfaces here as a conflict.
    let repo = UserRepository::new(state.db.pool.clone());
    repo.create(&user, &password_hash).map_err(|e| {
        if db::is_constraint_violation(&e) {
            ApiError::Conflict("That username is already taken".to_string())
        } else {
            ApiError::InternalError(e.to_string())
        }
    })?;

    tracing::info!("Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User successfully created",
            "user_id": user.id,
        })),
    ))
}

/// POST /login - Authenticate and establish a session
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = UserRepository::new(state.db.pool.clone());

    let credentials = repo
        .credentials_by_username(&payload.username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let Some((user_id, stored_hash)) = credentials else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let verified = password::verify(&payload.password, &stored_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if !verified {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let session_token = state
        .session_manager
        .create_session(user_id, payload.remember)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::InternalError("User row vanished after login".to_string()))?;

    let max_age = if payload.remember {
        30 * 24 * 3600
    } else {
        3600
    };
    let cookie = format!(
        "{SESSION_COOKIE}={session_token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user,
            session_token,
        }),
    ))
}

/// GET /logout - End the current session
pub async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = auth::session_token(&headers) {
        state
            .session_manager
            .delete_session(&token)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")))
}
