use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mingle_types::Comment;

use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new comment
    pub fn create(&self, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (id, post_id, author_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    /// Comments on a post with author usernames, newest first
    pub fn list_for_post(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at DESC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                Ok(Comment {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    author_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                    author_username: row.get(3)?,
                    content: row.get(4)?,
                    created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Number of comment rows referencing a post
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
