use axum::{extract::State, Json};
use chrono::NaiveDate;

use mingle_types::{Profile, UpdateProfileRequest, User};

use super::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::db::repositories::UserRepository;
use crate::sanitize;
use crate::state::AppState;

/// GET /profile - The acting user's own profile
pub async fn get_profile(CurrentUser(user): CurrentUser) -> ApiResult<Json<User>> {
    Ok(Json(user))
}

/// POST /profile - Update the acting user's own profile
///
/// All six fields are required; free-text fields are sanitized before
/// storage. Only the session owner ever reaches their own row.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let education = sanitize::clean(&payload.education);
    let employment = sanitize::clean(&payload.employment);
    let favorite_music = sanitize::clean(&payload.favorite_music);
    let favorite_movie = sanitize::clean(&payload.favorite_movie);
    let nationality = sanitize::clean(&payload.nationality);

    for (field, value) in [
        ("education", &education),
        ("employment", &employment),
        ("favorite_music", &favorite_music),
        ("favorite_movie", &favorite_movie),
        ("nationality", &nationality),
    ] {
        if value.is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }

    if NaiveDate::parse_from_str(&payload.birthday, "%Y-%m-%d").is_err() {
        return Err(ApiError::Validation(
            "birthday must be a date in YYYY-MM-DD format".to_string(),
        ));
    }

    let profile = Profile {
        education: Some(education),
        employment: Some(employment),
        favorite_music: Some(favorite_music),
        favorite_movie: Some(favorite_movie),
        nationality: Some(nationality),
        birthday: Some(payload.birthday),
    };

    let repo = UserRepository::new(state.db.pool.clone());
    repo.update_profile(&user.id, &profile)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user_id": user.id,
    })))
}
