use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::state::AppState;
use crate::upload;

/// GET /uploads/:key - Serve an uploaded image to an authenticated requester
///
/// The key must parse back as a generated storage key (uuid + allowed
/// extension) before the filesystem is touched, so traversal sequences and
/// verbatim client names never become paths.
pub async fn serve_upload(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    if !upload::is_valid_key(&key) {
        return Err(ApiError::BadRequest("Invalid upload key".to_string()));
    }

    let path = state.uploads_dir.join(&key);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("No such upload".to_string()));
        }
        Err(e) => return Err(ApiError::InternalError(e.to_string())),
    };

    Ok(([(header::CONTENT_TYPE, upload::content_type(&key))], data).into_response())
}
