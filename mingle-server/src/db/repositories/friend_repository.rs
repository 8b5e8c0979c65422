use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use mingle_types::FriendEntry;

use crate::db::DbPool;

pub struct FriendRepository {
    pool: DbPool,
}

impl FriendRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check whether a friend edge exists between two users, in either
    /// direction. One stored row makes the pair friends both ways.
    pub fn edge_exists(&self, a: &Uuid, b: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM friends
             WHERE (user_id = ?1 AND friend_id = ?2)
                OR (user_id = ?2 AND friend_id = ?1)",
            (a.to_string(), b.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert one directed friend edge. A duplicate in the same direction
    /// surfaces as a constraint violation; callers pre-check both
    /// directions and report duplicates as conflicts.
    pub fn add_edge(&self, user_id: &Uuid, friend_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        conn.execute(
            "INSERT INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)",
            (user_id.to_string(), friend_id.to_string(), now),
        )
        .context("Failed to add friend")?;

        Ok(())
    }

    /// The friend set of a user, derived from edges in both directions
    pub fn friends_of(&self, user_id: &Uuid) -> Result<Vec<FriendEntry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.first_name, u.last_name
             FROM users u
             WHERE u.id IN (SELECT friend_id FROM friends WHERE user_id = ?1)
                OR u.id IN (SELECT user_id FROM friends WHERE friend_id = ?1)
             ORDER BY u.username",
        )?;

        let friends = stmt
            .query_map([user_id.to_string()], |row| {
                Ok(FriendEntry {
                    user_id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    username: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(friends)
    }
}
