use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use mingle_types::Post;

use super::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::db::repositories::PostRepository;
use crate::sanitize;
use crate::state::AppState;
use crate::upload;

/// GET /stream - Posts visible to the acting user: their own and their
/// friends', newest first
pub async fn get_stream(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Post>>> {
    let repo = PostRepository::new(state.db.pool.clone());
    let posts = repo
        .visible_to(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(posts))
}

/// POST /stream - Create a post, optionally with one attached image
///
/// Multipart form with a required `content` field and at most one `image`
/// file field. The image is stored under a generated key; the client
/// filename only contributes a normalized extension.
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let mut content: Option<String> = None;
    let mut image_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("content") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                content = Some(text);
            }
            Some("image") => {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

                // Browsers submit an empty file part when no image was chosen
                if data.is_empty() {
                    continue;
                }
                if image_key.is_some() {
                    return Err(ApiError::Validation(
                        "At most one image per post".to_string(),
                    ));
                }

                let filename = filename
                    .ok_or_else(|| ApiError::Validation("Image is missing a filename".to_string()))?;
                let key = upload::storage_key(&filename)
                    .ok_or_else(|| ApiError::Validation("Unsupported image type".to_string()))?;

                tokio::fs::write(state.uploads_dir.join(&key), &data)
                    .await
                    .map_err(|e| ApiError::InternalError(e.to_string()))?;
                image_key = Some(key);
            }
            _ => {}
        }
    }

    let content = sanitize::clean(content.as_deref().unwrap_or(""));
    if content.is_empty() {
        return Err(ApiError::Validation(
            "Post content cannot be empty".to_string(),
        ));
    }

    let post = Post {
        id: Uuid::new_v4(),
        author_id: user.id,
        author_username: user.username,
        content,
        image: image_key,
        created_at: Utc::now(),
        comment_count: 0,
    };

    let repo = PostRepository::new(state.db.pool.clone());
    repo.create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(post)))
}
