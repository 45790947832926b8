//! Event service: authoring, discovery and engagement.
//!
//! DESIGN
//! ======
//! Every operation that acts on behalf of someone resolves the session
//! user first. Only an event's creator may edit or delete it. Likes toggle;
//! registration is one-way from here and refuses a second attempt.
//! Discovery reads the full, newest-first event list and filters in memory.

use serde::Serialize;
use tracing::info;

use crate::models::{Event, EventStats, User};
use crate::services::ErrorCode;
use crate::services::account::{self, AccountError};
use crate::services::storage::LocalStore;
use crate::util::format::{generate_id, now_rfc3339};

/// Number of featured events on the home listing.
pub const TOP_EVENTS: usize = 3;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("event not found: {0}")]
    NotFound(String),
    #[error("you can only modify events you created")]
    NotCreator,
    #[error("please fill all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("already registered")]
    AlreadyRegistered,
    #[error("failed to {0}, please try again")]
    Storage(&'static str),
}

impl ErrorCode for EventError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::NotFound(_) => "E_EVENT_NOT_FOUND",
            Self::NotCreator => "E_NOT_CREATOR",
            Self::MissingFields(_) => "E_MISSING_FIELDS",
            Self::AlreadyRegistered => "E_ALREADY_REGISTERED",
            Self::Storage(_) => "E_STORAGE",
        }
    }
}

impl From<AccountError> for EventError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Storage(action) => Self::Storage(action),
            _ => Self::NotLoggedIn,
        }
    }
}

/// User-entered event fields, as typed into the create and edit forms.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub price: String,
    pub description: String,
    pub cover_image: String,
}

impl EventDraft {
    /// Names of fields that are blank after trimming. Every field is required.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("date", &self.date),
            ("time", &self.time),
            ("location", &self.location),
            ("price", &self.price),
            ("description", &self.description),
            ("cover_image", &self.cover_image),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// # Errors
    ///
    /// `MissingFields` listing every blank field.
    pub fn validate(&self) -> Result<(), EventError> {
        let missing = self.missing_fields();
        if missing.is_empty() { Ok(()) } else { Err(EventError::MissingFields(missing)) }
    }

    /// Copy the trimmed draft fields onto `event`.
    fn apply_to(&self, event: &mut Event) {
        event.title = self.title.trim().to_string();
        event.date = self.date.trim().to_string();
        event.time = Some(self.time.trim().to_string());
        event.location = self.location.trim().to_string();
        event.price = Some(self.price.trim().to_string());
        event.description = Some(self.description.trim().to_string());
        event.cover_image = Some(self.cover_image.trim().to_string());
    }
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            date: event.date.clone(),
            time: event.time.clone().unwrap_or_default(),
            location: event.location.clone(),
            price: event.price.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
            cover_image: event.cover_image.clone().unwrap_or_default(),
        }
    }
}

/// Everything the detail view shows for one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    pub event: Event,
    pub liked: bool,
    pub registered: bool,
    pub is_creator: bool,
    pub stats: EventStats,
    /// Registrations times ticket price. Only filled in for the creator.
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub liked_events: Vec<Event>,
    pub created_events: Vec<Event>,
}

// =============================================================================
// HELPERS
// =============================================================================

async fn load_event(store: &LocalStore, event_id: &str) -> Result<Event, EventError> {
    store
        .get_event_by_id(event_id)
        .await
        .ok_or_else(|| EventError::NotFound(event_id.to_string()))
}

/// Load an event and check the session user created it.
async fn load_owned_event(store: &LocalStore, event_id: &str) -> Result<Event, EventError> {
    let user = account::require_user(store).await?;
    let event = load_event(store, event_id).await?;
    if event.creator_id != user.id {
        return Err(EventError::NotCreator);
    }
    Ok(event)
}

// =============================================================================
// AUTHORING
// =============================================================================

/// Create an event owned by the session user.
///
/// # Errors
///
/// `MissingFields`, `NotLoggedIn`, or `Storage` if the write fails.
pub async fn create_event(store: &LocalStore, draft: &EventDraft) -> Result<Event, EventError> {
    draft.validate()?;
    let user = account::require_user(store).await?;

    let mut event = Event {
        id: generate_id(),
        title: String::new(),
        description: None,
        location: String::new(),
        date: String::new(),
        time: None,
        price: None,
        cover_image: None,
        creator_id: user.id,
        created_at: now_rfc3339(),
    };
    draft.apply_to(&mut event);

    if !store.save_event(&event).await {
        return Err(EventError::Storage("create event"));
    }
    info!(event_id = %event.id, creator_id = %event.creator_id, "event created");
    Ok(event)
}

/// Replace the editable fields of an event the session user created.
/// `id`, `creatorId` and `createdAt` are preserved.
///
/// # Errors
///
/// `MissingFields`, `NotLoggedIn`, `NotFound`, `NotCreator`, or `Storage`.
pub async fn update_event(store: &LocalStore, event_id: &str, draft: &EventDraft) -> Result<Event, EventError> {
    draft.validate()?;
    let mut event = load_owned_event(store, event_id).await?;
    draft.apply_to(&mut event);

    if !store.save_event(&event).await {
        return Err(EventError::Storage("update event"));
    }
    info!(event_id = %event.id, "event updated");
    Ok(event)
}

/// Delete an event the session user created. Likes and registrations that
/// reference it are left in place.
///
/// # Errors
///
/// `NotLoggedIn`, `NotFound`, `NotCreator`, or `Storage`.
pub async fn delete_event(store: &LocalStore, event_id: &str) -> Result<(), EventError> {
    let event = load_owned_event(store, event_id).await?;
    if !store.delete_event(&event.id).await {
        return Err(EventError::Storage("delete event"));
    }
    info!(event_id = %event.id, "event deleted");
    Ok(())
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// Events matching `query` in title, location or description, newest first.
pub async fn search_events(store: &LocalStore, query: &str) -> Vec<Event> {
    store
        .get_all_events()
        .await
        .into_iter()
        .filter(|e| e.matches_query(query))
        .collect()
}

/// The `n` most recently created events.
pub async fn top_events(store: &LocalStore, n: usize) -> Vec<Event> {
    let mut events = store.get_all_events().await;
    events.truncate(n);
    events
}

/// # Errors
///
/// `NotLoggedIn` or `NotFound`.
pub async fn event_details(store: &LocalStore, event_id: &str) -> Result<EventDetails, EventError> {
    let user = account::require_user(store).await?;
    let event = load_event(store, event_id).await?;

    let liked = store.is_event_liked(&user.id, event_id).await;
    let registered = store.is_user_registered(&user.id, event_id).await;
    let stats = store.get_event_stats(event_id).await;
    let is_creator = event.creator_id == user.id;
    let revenue = is_creator.then(|| creator_revenue(&event, stats));

    Ok(EventDetails { event, liked, registered, is_creator, stats, revenue })
}

/// Unparseable or missing prices count as free.
#[allow(clippy::cast_precision_loss)]
fn creator_revenue(event: &Event, stats: EventStats) -> f64 {
    let price = event
        .price
        .as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .unwrap_or(0.0);
    stats.registrations as f64 * price
}

// =============================================================================
// ENGAGEMENT
// =============================================================================

/// Flip the session user's like on an event. Returns whether it is now liked.
///
/// # Errors
///
/// `NotLoggedIn`, `NotFound`, or `Storage`.
pub async fn toggle_like(store: &LocalStore, event_id: &str) -> Result<bool, EventError> {
    let user = account::require_user(store).await?;
    load_event(store, event_id).await?;

    let liked = store.is_event_liked(&user.id, event_id).await;
    let ok = if liked {
        store.unlike_event(&user.id, event_id).await
    } else {
        store.like_event(&user.id, event_id).await
    };
    if !ok {
        return Err(EventError::Storage("update like status"));
    }
    Ok(!liked)
}

/// Register the session user for an event.
///
/// # Errors
///
/// `NotLoggedIn`, `NotFound`, `AlreadyRegistered`, or `Storage`.
pub async fn register(store: &LocalStore, event_id: &str) -> Result<EventStats, EventError> {
    let user = account::require_user(store).await?;
    load_event(store, event_id).await?;

    if store.is_user_registered(&user.id, event_id).await {
        return Err(EventError::AlreadyRegistered);
    }
    if !store.register_for_event(&user.id, event_id).await {
        return Err(EventError::Storage("register"));
    }
    info!(event_id, user_id = %user.id, "registered for event");
    Ok(store.get_event_stats(event_id).await)
}

/// The session user with the events they liked and the events they created.
///
/// # Errors
///
/// `NotLoggedIn`.
pub async fn profile(store: &LocalStore) -> Result<Profile, EventError> {
    let user = account::require_user(store).await?;
    let liked_ids = store.get_user_likes(&user.id).await;
    let events = store.get_all_events().await;

    let liked_events = events
        .iter()
        .filter(|e| liked_ids.contains(&e.id))
        .cloned()
        .collect();
    let created_events = events
        .into_iter()
        .filter(|e| e.creator_id == user.id)
        .collect();

    Ok(Profile { user, liked_events, created_events })
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
