use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use mingle_types::Post;

use crate::db::DbPool;

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_post(row: &Row) -> rusqlite::Result<Post> {
        Ok(Post {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            author_username: row.get(2)?,
            content: row.get(3)?,
            image: row.get(4)?,
            created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
            comment_count: row.get(6)?,
        })
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, content, image, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.content,
                &post.image,
                post.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Posts visible to the acting user: their own plus those of anyone
    /// connected by a friend edge in either direction, newest first.
    /// Comment counts come from an aggregate, never a stored column.
    pub fn visible_to(&self, user_id: &Uuid) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.author_id, u.username, p.content, p.image, p.created_at,
                    (SELECT COUNT(*) FROM comments WHERE post_id = p.id) AS comment_count
             FROM posts p
             JOIN users u ON u.id = p.author_id
             WHERE p.author_id = ?1
                OR p.author_id IN (SELECT friend_id FROM friends WHERE user_id = ?1)
                OR p.author_id IN (SELECT user_id FROM friends WHERE friend_id = ?1)
             ORDER BY p.created_at DESC",
        )?;

        let posts = stmt
            .query_map([user_id.to_string()], Self::map_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.author_id, u.username, p.content, p.image, p.created_at,
                    (SELECT COUNT(*) FROM comments WHERE post_id = p.id) AS comment_count
             FROM posts p
             JOIN users u ON u.id = p.author_id
             WHERE p.id = ?",
        )?;

        let post = stmt
            .query_row([post_id.to_string()], Self::map_post)
            .optional()?;

        Ok(post)
    }
}
