use async_trait::async_trait;

use super::{AppState, CommandError, Output, UserCommand};
use crate::storage::{Post, User};
use crate::util::strip_control_chars;

/// Newest posts across the feeds the current user follows.
pub struct Browse {
    pub limit: i64,
}

#[async_trait]
impl UserCommand for Browse {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError> {
        let posts = state.db.get_posts_for_user(user.id, self.limit).await?;
        if posts.is_empty() {
            return Ok(vec![format!(
                "No posts yet for {}: follow a feed and run `gator agg`",
                user.name
            )]);
        }

        Ok(posts.iter().flat_map(render_post).collect())
    }
}

fn render_post(post: &Post) -> Vec<String> {
    let date = post
        .published_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "undated".to_string());

    let mut lines = vec![
        format!("{} | {}", date, strip_control_chars(&post.title)),
        format!("    {}", strip_control_chars(&post.url)),
    ];
    if let Some(description) = &post.description {
        lines.push(format!("    {}", strip_control_chars(description)));
    }
    lines.push(String::new());
    lines
}
