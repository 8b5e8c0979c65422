use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use mingle_types::{Profile, User};

use crate::db::DbPool;

const USER_COLUMNS: &str = "id, username, first_name, last_name, created_at, \
     education, employment, favorite_music, favorite_movie, nationality, birthday";

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            created_at: row.get::<_, String>(4)?.parse::<DateTime<Utc>>().unwrap(),
            profile: Profile {
                education: row.get(5)?,
                employment: row.get(6)?,
                favorite_music: row.get(7)?,
                favorite_movie: row.get(8)?,
                nationality: row.get(9)?,
                birthday: row.get(10)?,
            },
        })
    }

    /// Create a new user. A duplicate username surfaces as a constraint
    /// violation, which the caller reports as a conflict.
    pub fn create(&self, user: &User, password_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, first_name, last_name, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                user.id.to_string(),
                &user.username,
                &user.first_name,
                &user.last_name,
                password_hash,
                user.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create user")?;
        Ok(())
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))?;

        let user = stmt
            .query_row([user_id.to_string()], Self::map_user)
            .optional()?;

        Ok(user)
    }

    /// Get user by username (exact, case-sensitive match)
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))?;

        let user = stmt.query_row([username], Self::map_user).optional()?;

        Ok(user)
    }

    /// Look up the id and stored password hash for a login attempt.
    pub fn credentials_by_username(&self, username: &str) -> Result<Option<(Uuid, String)>> {
        let conn = self.pool.get()?;
        let creds = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?",
                [username],
                |row| {
                    Ok((
                        Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        row.get::<_, String>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(creds)
    }

    /// Replace the profile fields of a user. Only the owning user reaches
    /// this through the API.
    pub fn update_profile(&self, user_id: &Uuid, profile: &Profile) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users
             SET education = ?, employment = ?, favorite_music = ?,
                 favorite_movie = ?, nationality = ?, birthday = ?
             WHERE id = ?",
            (
                &profile.education,
                &profile.employment,
                &profile.favorite_music,
                &profile.favorite_movie,
                &profile.nationality,
                &profile.birthday,
                user_id.to_string(),
            ),
        )
        .context("Failed to update user profile")?;
        Ok(())
    }
}
