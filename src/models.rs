//! Persisted record shapes.
//!
//! DESIGN
//! ======
//! Records serialize with camelCase field names and omit unset optional
//! fields, matching the JSON blobs already on devices. Collections are
//! id-keyed maps; relations map one id to a list of ids with set semantics
//! enforced by the store, not the type.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::format::parse_timestamp;

// =============================================================================
// RECORD
// =============================================================================

/// A record that lives in an id-keyed collection.
pub trait Record {
    fn id(&self) -> &str;

    /// Order used when a collection is listed. Defaults to id order.
    fn listing_order(a: &Self, b: &Self) -> Ordering
    where
        Self: Sized,
    {
        a.id().cmp(b.id())
    }
}

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Unique ignoring case.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// EVENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    /// ISO date, e.g. `2026-10-14`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Decimal string; `"0"` means free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub creator_id: String,
    /// RFC 3339 timestamp used for default ordering.
    pub created_at: String,
}

impl Record for Event {
    fn id(&self) -> &str {
        &self.id
    }

    /// Newest `createdAt` first. Unparseable timestamps sort after all valid ones.
    fn listing_order(a: &Self, b: &Self) -> Ordering {
        match (parse_timestamp(&a.created_at), parse_timestamp(&b.created_at)) {
            (Some(ta), Some(tb)) => tb.cmp(&ta),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl Event {
    /// Case-insensitive substring match on title, location and description.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.location.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }
}

// =============================================================================
// STATS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub registrations: usize,
    pub likes: usize,
}

// =============================================================================
// MAPS
// =============================================================================

pub type UsersMap = BTreeMap<String, User>;
pub type EventsMap = BTreeMap<String, Event>;
/// userId -> eventIds
pub type LikesMap = BTreeMap<String, Vec<String>>;
/// eventId -> userIds
pub type RegistrationsMap = BTreeMap<String, Vec<String>>;

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
