use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use mingle_types::{Comment, CreateCommentRequest, Post, User};

use super::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::db::repositories::{CommentRepository, FriendRepository, PostRepository};
use crate::sanitize;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CommentsPage {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Load a post iff it is feed-visible to the viewer: their own, or authored
/// by someone connected by a friend edge in either direction. Invisible
/// posts answer not-found so their existence is not leaked.
fn visible_post(state: &AppState, viewer: &User, post_id: &Uuid) -> Result<Post, ApiError> {
    let post = PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != viewer.id {
        let friends = FriendRepository::new(state.db.pool.clone());
        let connected = friends
            .edge_exists(&viewer.id, &post.author_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        if !connected {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }
    }

    Ok(post)
}

/// GET /comments/:post_id - View a post with its comments, newest first
pub async fn get_comments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<CommentsPage>> {
    let post_id =
        Uuid::parse_str(&post_id).map_err(|_| ApiError::BadRequest("Invalid post ID".to_string()))?;

    let post = visible_post(&state, &user, &post_id)?;

    let comments = CommentRepository::new(state.db.pool.clone())
        .list_for_post(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(CommentsPage { post, comments }))
}

/// POST /comments/:post_id - Add a comment to a visible post
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let post_id =
        Uuid::parse_str(&post_id).map_err(|_| ApiError::BadRequest("Invalid post ID".to_string()))?;

    // Comment-write is gated on comment-read visibility
    let post = visible_post(&state, &user, &post_id)?;

    let content = sanitize::clean(&payload.content);
    if content.is_empty() {
        return Err(ApiError::Validation(
            "Comment content cannot be empty".to_string(),
        ));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        post_id: post.id,
        author_id: user.id,
        author_username: user.username,
        content,
        created_at: Utc::now(),
    };

    CommentRepository::new(state.db.pool.clone())
        .create(&comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}
