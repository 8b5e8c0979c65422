use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// An account holder. The password hash never leaves the server, so it is
/// not part of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Optional profile fields, editable only by the owning user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub education: Option<String>,
    pub employment: Option<String>,
    pub favorite_music: Option<String>,
    pub favorite_movie: Option<String>,
    pub nationality: Option<String>,
    pub birthday: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    /// Storage key of an attached image, if any
    #[serde(default)]
    pub image: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    /// Number of comments on this post, computed as an aggregate
    #[serde(default)]
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// One entry in a user's friend listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendEntry {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddFriendRequest {
    pub username: String,
}

/// Profile update: every field is required, per the profile form.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub education: String,
    pub employment: String,
    pub favorite_music: String,
    pub favorite_movie: String,
    pub nationality: String,
    pub birthday: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
