use chrono::Utc;

use super::schema::Database;
use super::types::{to_micros, NewPost, Post, PostRow, StoreError};

/// Maximum number of posts to return from any single query (OOM protection)
const MAX_POSTS: i64 = 2000;

const POST_COLUMNS: &str =
    "p.id, p.feed_id, p.title, p.description, p.url, p.published_at, p.created_at, p.updated_at";

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a post.
    ///
    /// `posts.url` is UNIQUE: inserting a URL that is already stored returns
    /// `StoreError::Duplicate` and leaves the existing row untouched. The
    /// ingestion loop treats that as "already have it".
    pub async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let now = to_micros(Utc::now());
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (feed_id, title, description, url, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, feed_id, title, description, url, published_at, created_at, updated_at
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.url)
        .bind(post.published_at.map(to_micros))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_post())
    }

    /// Newest posts from the feeds `user_id` follows.
    ///
    /// Ordered by publication date (undated posts last), then by when the
    /// aggregator stored them. `limit` is capped at `MAX_POSTS`.
    pub async fn get_posts_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Post>, StoreError> {
        let limit = limit.clamp(0, MAX_POSTS);
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC, p.id DESC
            LIMIT ?
        "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    /// All posts stored for one feed, in insertion order
    pub async fn get_posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            WHERE p.feed_id = ?
            ORDER BY p.id
            LIMIT ?
        "#
        ))
        .bind(feed_id)
        .bind(MAX_POSTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    /// Number of posts stored for one feed
    pub async fn count_posts_for_feed(&self, feed_id: i64) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
