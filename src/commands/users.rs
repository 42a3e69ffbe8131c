use super::{AppState, CommandError, Output};
use crate::storage::StoreError;

/// Create a user and make them the current user.
pub async fn register(state: &mut AppState, name: &str) -> Result<Output, CommandError> {
    let user = state.db.create_user(name).await.map_err(|e| match e {
        StoreError::Duplicate(_) => StoreError::Duplicate(format!("user '{}'", name)),
        other => other,
    })?;
    state.config.set_user(&user.name)?;

    tracing::info!(user = %user.name, id = user.id, "User registered");
    Ok(vec![format!("User {} created and logged in", user.name)])
}

/// Switch the current user to an existing one.
pub async fn login(state: &mut AppState, name: &str) -> Result<Output, CommandError> {
    let user = state.db.get_user(name).await.map_err(|e| match e {
        StoreError::NotFound(what) => CommandError::NotFound(what),
        other => other.into(),
    })?;
    state.config.set_user(&user.name)?;

    Ok(vec![format!("Logged in as {}", user.name)])
}

/// Delete every user; their feeds, follows and posts cascade.
pub async fn reset(state: &AppState) -> Result<Output, CommandError> {
    let removed = state.db.delete_users().await?;
    tracing::info!(users = removed, "Database reset");
    Ok(vec![format!("Database reset ({} users removed)", removed)])
}

pub async fn list_users(state: &AppState) -> Result<Output, CommandError> {
    let current = state.config.current_user_name.as_deref();
    let users = state.db.get_users().await?;

    Ok(users
        .into_iter()
        .map(|user| {
            if Some(user.name.as_str()) == current {
                format!("* {} (current)", user.name)
            } else {
                format!("* {}", user.name)
            }
        })
        .collect())
}
