use async_trait::async_trait;

use super::{AppState, CommandError, Output, UserCommand};
use crate::storage::{StoreError, User};
use crate::util::validate_feed_url;

fn not_found(e: StoreError) -> CommandError {
    match e {
        StoreError::NotFound(what) => CommandError::NotFound(what),
        other => other.into(),
    }
}

/// Register a new feed owned by the current user, who follows it straight away.
pub struct AddFeed {
    pub name: String,
    pub url: String,
}

#[async_trait]
impl UserCommand for AddFeed {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError> {
        validate_feed_url(&self.url)?;
        // Stored as typed so `follow`/`unfollow` match on the same string
        let url = self.url.trim();

        let feed = state
            .db
            .create_feed(user.id, &self.name, url)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::Duplicate(format!("feed '{}'", url)),
                other => other,
            })?;

        tracing::info!(feed = %feed.name, url = %feed.url, user = %user.name, "Feed added");
        Ok(vec![
            format!("Feed added: {} ({})", feed.name, feed.url),
            format!("{} now follows {}", user.name, feed.name),
        ])
    }
}

/// Every feed in the database with the user who added it.
pub async fn list_feeds(state: &AppState) -> Result<Output, CommandError> {
    let feeds = state.db.get_feeds().await?;
    Ok(feeds
        .into_iter()
        .map(|f| format!("* {} ({}) added by {}", f.name, f.url, f.user_name))
        .collect())
}

/// Follow a feed someone already added.
pub struct Follow {
    pub url: String,
}

#[async_trait]
impl UserCommand for Follow {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError> {
        let feed = state
            .db
            .get_feed_by_url(self.url.trim())
            .await
            .map_err(not_found)?;

        let follow = state
            .db
            .create_feed_follow(user.id, feed.id)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    StoreError::Duplicate(format!("{} already follows {}", user.name, feed.name))
                }
                other => other,
            })?;

        Ok(vec![format!("{} now follows {}", follow.user_name, follow.feed_name)])
    }
}

pub struct Following;

#[async_trait]
impl UserCommand for Following {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError> {
        let follows = state.db.get_feed_follows_for_user(user.id).await?;
        Ok(follows
            .into_iter()
            .map(|f| format!("* {}", f.feed_name))
            .collect())
    }
}

pub struct Unfollow {
    pub url: String,
}

#[async_trait]
impl UserCommand for Unfollow {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError> {
        let url = self.url.trim();
        state
            .db
            .delete_feed_follow(user.id, url)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    CommandError::NotFound(format!("{} does not follow {}", user.name, url))
                }
                other => other.into(),
            })?;

        Ok(vec![format!("{} unfollowed {}", user.name, url)])
    }
}
