use axum::{extract::State, http::StatusCode, Json};

use mingle_types::{AddFriendRequest, FriendEntry};

use super::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::db::{
    self,
    repositories::{FriendRepository, UserRepository},
};
use crate::state::AppState;

/// GET /friends - The acting user's friend set, derived from edges in
/// both directions
pub async fn get_friends(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<FriendEntry>>> {
    let repo = FriendRepository::new(state.db.pool.clone());
    let friends = repo
        .friends_of(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(friends))
}

/// POST /friends - Add a friend by username
///
/// Three distinct user-visible failures: unknown username (not-found),
/// adding yourself (validation), an edge already present in either
/// direction (conflict).
pub async fn add_friend(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AddFriendRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let user_repo = UserRepository::new(state.db.pool.clone());
    let friend_repo = FriendRepository::new(state.db.pool.clone());

    let target = user_repo
        .get_by_username(&payload.username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

    if target.id == user.id {
        return Err(ApiError::Validation(
            "You cannot be friends with yourself".to_string(),
        ));
    }

    let already = friend_repo
        .edge_exists(&user.id, &target.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if already {
        return Err(ApiError::Conflict(
            "You are already friends with this user".to_string(),
        ));
    }

    // The composite primary key arbitrates a race between two identical
    // adds; the loser lands here as a conflict too.
    friend_repo.add_edge(&user.id, &target.id).map_err(|e| {
        if db::is_constraint_violation(&e) {
            ApiError::Conflict("You are already friends with this user".to_string())
        } else {
            ApiError::InternalError(e.to_string())
        }
    })?;

    tracing::info!("{} added {} as a friend", user.username, target.username);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Friend successfully added",
            "friend_id": target.id,
        })),
    ))
}
