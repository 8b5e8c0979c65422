use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Database-backed session manager for persistent authentication
///
/// Manages user sessions with token-based authentication, including:
/// - Session creation with UUID v4 tokens and bounded lifetimes
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Automatic cleanup of expired sessions
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new session for a user
    ///
    /// Generates a UUID v4 token and stores it in the database. The default
    /// lifetime is one hour; a remember-me login extends it to 30 days.
    pub fn create_session(&self, user_id: Uuid, remember: bool) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let lifetime = if remember {
            Duration::days(30)
        } else {
            Duration::hours(1)
        };
        let expires_at = created_at + lifetime;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id.to_string(),
                created_at.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    ///
    /// Checks if the token exists in the database and has not expired.
    pub fn validate_session(&self, token: &str) -> Result<Uuid> {
        let conn = self.db.connection()?;

        let (user_id_str, expires_at_str): (String, String) = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Session not found")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        // Check if session has expired
        if Utc::now() > expires_at {
            // Clean up expired session
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        let user_id = Uuid::parse_str(&user_id_str).context("Failed to parse user ID")?;

        Ok(user_id)
    }

    /// Delete a session (logout)
    ///
    /// Removes the session from the database, effectively logging out the user.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Clean up expired sessions from the database
    ///
    /// Removes all sessions that have passed their expiry time.
    /// This should be called periodically to prevent database bloat.
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
