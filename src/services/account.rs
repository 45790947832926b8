//! Account service: signup, login and the session pointer.
//!
//! DESIGN
//! ======
//! Usernames are trimmed and unique ignoring case. A session is simply the
//! user record copied into the current-user slot; logging in again replaces
//! it and logging out removes it.

use tracing::info;

use crate::models::User;
use crate::services::ErrorCode;
use crate::services::storage::LocalStore;
use crate::util::format::{generate_id, now_rfc3339};

pub const DEFAULT_BIO: &str = "Event enthusiast and community builder.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("please enter a username")]
    EmptyUsername,
    #[error("username already exists: {0}")]
    UsernameTaken(String),
    #[error("no account found with username: {0}")]
    UserNotFound(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("failed to {0}, please try again")]
    Storage(&'static str),
}

impl ErrorCode for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "E_EMPTY_USERNAME",
            Self::UsernameTaken(_) => "E_USERNAME_TAKEN",
            Self::UserNotFound(_) => "E_USER_NOT_FOUND",
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::Storage(_) => "E_STORAGE",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create an account and log it in.
///
/// # Errors
///
/// `EmptyUsername`, `UsernameTaken`, or `Storage` when either write fails.
pub async fn signup(store: &LocalStore, form: SignupForm) -> Result<User, AccountError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(AccountError::EmptyUsername);
    }
    if store.get_user_by_username(username).await.is_some() {
        return Err(AccountError::UsernameTaken(username.to_string()));
    }

    let bio = form
        .bio
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_BIO);
    let avatar = form
        .avatar
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let user = User {
        id: generate_id(),
        username: username.to_string(),
        bio: Some(bio.to_string()),
        avatar,
        created_at: Some(now_rfc3339()),
    };

    if !store.save_user(&user).await || !store.save_current_user(&user).await {
        return Err(AccountError::Storage("create account"));
    }

    info!(user_id = %user.id, username = %user.username, "account created");
    Ok(user)
}

/// Log in as an existing user.
///
/// # Errors
///
/// `EmptyUsername`, `UserNotFound`, or `Storage` when the session write fails.
pub async fn login(store: &LocalStore, username: &str) -> Result<User, AccountError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AccountError::EmptyUsername);
    }
    let user = store
        .get_user_by_username(username)
        .await
        .ok_or_else(|| AccountError::UserNotFound(username.to_string()))?;

    if !store.save_current_user(&user).await {
        return Err(AccountError::Storage("login"));
    }

    info!(user_id = %user.id, "logged in");
    Ok(user)
}

/// # Errors
///
/// `Storage` when the session key cannot be removed.
pub async fn logout(store: &LocalStore) -> Result<(), AccountError> {
    if !store.logout().await {
        return Err(AccountError::Storage("logout"));
    }
    info!("logged out");
    Ok(())
}

/// The logged-in user.
///
/// # Errors
///
/// `NotLoggedIn` when the session slot is empty.
pub async fn require_user(store: &LocalStore) -> Result<User, AccountError> {
    store.get_current_user().await.ok_or(AccountError::NotLoggedIn)
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
