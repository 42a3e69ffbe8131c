use chrono::Utc;

use super::schema::Database;
use super::types::{to_micros, Feed, FeedRow, FeedWithOwner, StoreError};

const FEED_COLUMNS: &str = "id, name, url, user_id, created_at, updated_at, last_fetched_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Create a feed owned by `user_id` and follow it on the owner's behalf.
    ///
    /// Both rows are written in one transaction. A URL that is already
    /// registered is `StoreError::Duplicate` and nothing is written.
    pub async fn create_feed(&self, user_id: i64, name: &str, url: &str) -> Result<Feed, StoreError> {
        let now = to_micros(Utc::now());
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {FEED_COLUMNS}
        "#
        ))
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(row.id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_feed())
    }

    /// Look up a feed by its (unique) URL
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedRow::into_feed)
            .ok_or_else(|| StoreError::NotFound(format!("feed with url '{}'", url)))
    }

    /// Look up a feed by id
    pub async fn get_feed(&self, feed_id: i64) -> Result<Feed, StoreError> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"
        ))
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedRow::into_feed)
            .ok_or_else(|| StoreError::NotFound(format!("feed {}", feed_id)))
    }

    /// All feeds with the name of the user who added them
    pub async fn get_feeds(&self) -> Result<Vec<FeedWithOwner>, StoreError> {
        let feeds = sqlx::query_as::<_, FeedWithOwner>(
            r#"
            SELECT f.name, f.url, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.name, f.id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    // ========================================================================
    // Ingestion Operations
    // ========================================================================

    /// Pick the feed that is most overdue: never-fetched feeds first, then
    /// the oldest `last_fetched_at`. Ties go to the lowest id.
    ///
    /// Read-only. An empty subscription set is `StoreError::NotFound`.
    pub async fn next_feed_to_fetch(&self) -> Result<Feed, StoreError> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
        "#
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedRow::into_feed)
            .ok_or_else(|| StoreError::NotFound("no feeds registered".to_string()))
    }

    /// Stamp `last_fetched_at` (and `updated_at`) with the current UTC time
    pub async fn mark_feed_fetched(&self, feed_id: i64) -> Result<(), StoreError> {
        let now = to_micros(Utc::now());
        let result =
            sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(now)
                .bind(feed_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("feed {}", feed_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, Feed, StoreError};
    use std::collections::HashSet;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn seed_feeds(db: &Database, count: usize) -> Vec<Feed> {
        let user = db.create_user("tester").await.unwrap();
        let mut feeds = Vec::with_capacity(count);
        for i in 0..count {
            let feed = db
                .create_feed(
                    user.id,
                    &format!("Feed {}", i),
                    &format!("https://feed{}.example.com/rss", i),
                )
                .await
                .unwrap();
            feeds.push(feed);
        }
        feeds
    }

    #[tokio::test]
    async fn test_create_feed() {
        let db = test_db().await;
        let feeds = seed_feeds(&db, 1).await;
        assert_eq!(feeds[0].name, "Feed 0");
        assert!(feeds[0].last_fetched_at.is_none());

        let by_url = db
            .get_feed_by_url("https://feed0.example.com/rss")
            .await
            .unwrap();
        assert_eq!(by_url, feeds[0]);
    }

    #[tokio::test]
    async fn test_create_feed_duplicate_url() {
        let db = test_db().await;
        let user = db.create_user("tester").await.unwrap();
        db.create_feed(user.id, "One", "https://example.com/rss")
            .await
            .unwrap();

        let err = db
            .create_feed(user.id, "Two", "https://example.com/rss")
            .await
            .unwrap_err();
        assert!(err.is_duplicate(), "Expected Duplicate, got {:?}", err);

        // Transaction rolled back: still exactly one feed
        assert_eq!(db.get_feeds().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_feeds_includes_owner() {
        let db = test_db().await;
        seed_feeds(&db, 2).await;

        let feeds = db.get_feeds().await.unwrap();
        assert_eq!(feeds.len(), 2);
        assert!(feeds.iter().all(|f| f.user_name == "tester"));
        assert_eq!(feeds[0].name, "Feed 0");
    }

    #[tokio::test]
    async fn test_next_feed_empty_is_not_found() {
        let db = test_db().await;
        let err = db.next_feed_to_fetch().await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_next_feed_prefers_never_fetched() {
        let db = test_db().await;
        let feeds = seed_feeds(&db, 3).await;

        db.mark_feed_fetched(feeds[0].id).await.unwrap();
        db.mark_feed_fetched(feeds[2].id).await.unwrap();

        let next = db.next_feed_to_fetch().await.unwrap();
        assert_eq!(next.id, feeds[1].id);
        assert!(next.last_fetched_at.is_none());
    }

    #[tokio::test]
    async fn test_next_feed_does_not_mutate() {
        let db = test_db().await;
        seed_feeds(&db, 2).await;

        let first = db.next_feed_to_fetch().await.unwrap();
        let again = db.next_feed_to_fetch().await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_next_feed_oldest_fetch_first() {
        let db = test_db().await;
        let feeds = seed_feeds(&db, 3).await;

        db.mark_feed_fetched(feeds[2].id).await.unwrap();
        db.mark_feed_fetched(feeds[0].id).await.unwrap();
        db.mark_feed_fetched(feeds[1].id).await.unwrap();

        let next = db.next_feed_to_fetch().await.unwrap();
        assert_eq!(next.id, feeds[2].id);
    }

    #[tokio::test]
    async fn test_select_and_mark_rotates_through_all_feeds() {
        let db = test_db().await;
        let feeds = seed_feeds(&db, 4).await;

        let mut visited = Vec::new();
        for _ in 0..8 {
            let next = db.next_feed_to_fetch().await.unwrap();
            visited.push(next.id);
            db.mark_feed_fetched(next.id).await.unwrap();
        }

        // First round covers every feed exactly once, second round repeats it
        let first_round: HashSet<i64> = visited[..4].iter().copied().collect();
        assert_eq!(first_round.len(), 4);
        assert!(feeds.iter().all(|f| first_round.contains(&f.id)));
        assert_eq!(visited[..4], visited[4..]);
    }

    #[tokio::test]
    async fn test_mark_feed_fetched_sets_timestamp() {
        let db = test_db().await;
        let feeds = seed_feeds(&db, 1).await;
        let before = chrono::Utc::now();

        db.mark_feed_fetched(feeds[0].id).await.unwrap();

        let feed = db.get_feed(feeds[0].id).await.unwrap();
        let fetched_at = feed.last_fetched_at.expect("last_fetched_at should be set");
        assert!(fetched_at >= before - chrono::Duration::microseconds(1));
        assert_eq!(feed.updated_at, fetched_at);
    }

    #[tokio::test]
    async fn test_mark_unknown_feed_is_not_found() {
        let db = test_db().await;
        let err = db.mark_feed_fetched(4242).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
