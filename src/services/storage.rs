//! Local store: JSON collections over a device key-value store.
//!
//! DESIGN
//! ======
//! Five fixed keys each hold one JSON blob: the session user, the users and
//! events collections (id -> record), and the likes and registrations
//! relations (id -> list of ids). Every mutation reads the whole blob,
//! changes it in memory and writes the whole blob back.
//!
//! Failures never reach callers. Each operation logs the underlying error
//! and returns a neutral value (empty map, `None`, `false`), so "absent"
//! and "storage failed" look the same from outside.
//!
//! TRADE-OFFS
//! ==========
//! Read-modify-write is not atomic: two overlapping writers of one key lose
//! one side's change. There is no referential integrity between
//! collections; deleting an event leaves its likes and registrations behind.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::kv::{KvError, KvStore};
use crate::models::{Event, EventStats, EventsMap, LikesMap, Record, RegistrationsMap, User, UsersMap};

// =============================================================================
// KEYS
// =============================================================================

pub mod keys {
    pub const CURRENT_USER: &str = "@current_user";
    pub const EVENTS: &str = "@events";
    pub const USERS: &str = "@users";
    pub const LIKES: &str = "@likes";
    pub const REGISTRATIONS: &str = "@registrations";

    /// Every key the store manages.
    pub const ALL: [&str; 5] = [CURRENT_USER, EVENTS, USERS, LIKES, REGISTRATIONS];
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Kv(#[from] KvError),
    #[error("malformed blob: {0}")]
    Json(#[from] serde_json::Error),
}

/// Typed handle binding a store key to the record type kept under it.
pub struct Collection<T> {
    key: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Collection<T> {
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Collection<T> {}

impl Collection<User> {
    pub const USERS: Self = Self { key: keys::USERS, _record: PhantomData };
}

impl Collection<Event> {
    pub const EVENTS: Self = Self { key: keys::EVENTS, _record: PhantomData };
}

/// Many-to-many association stored as owner id -> member ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// userId -> liked eventIds
    Likes,
    /// eventId -> registered userIds
    Registrations,
}

impl Relation {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Likes => keys::LIKES,
            Self::Registrations => keys::REGISTRATIONS,
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Record-level access to the persisted collections. Cheap to clone.
#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KvStore>,
}

impl LocalStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    async fn read_json<V: DeserializeOwned + Default>(&self, key: &str) -> Result<V, StoreError> {
        match self.kv.get(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(V::default()),
        }
    }

    async fn write_json<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw).await?;
        Ok(())
    }

    /// Read a whole id -> value map, treating any failure as empty.
    async fn read_map<V: DeserializeOwned>(&self, key: &str) -> BTreeMap<String, V> {
        match self.read_json(key).await {
            Ok(map) => map,
            Err(e) => {
                error!(error = %e, key, "failed to read collection");
                BTreeMap::new()
            }
        }
    }

    /// Write a value back, logging and reporting `false` on failure.
    async fn write_or_log<V: Serialize + ?Sized>(&self, key: &str, value: &V, action: &str) -> bool {
        match self.write_json(key, value).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, key, action, "store write failed");
                false
            }
        }
    }

    // =========================================================================
    // COLLECTIONS
    // =========================================================================

    /// Every record in `collection`, keyed by id. Empty when absent or unreadable.
    pub async fn get_collection<T: DeserializeOwned>(&self, collection: Collection<T>) -> BTreeMap<String, T> {
        self.read_map(collection.key()).await
    }

    /// Insert or overwrite `record` under its id.
    pub async fn save_record<T>(&self, collection: Collection<T>, record: &T) -> bool
    where
        T: Record + Serialize + DeserializeOwned + Clone,
    {
        let mut map = self.get_collection(collection).await;
        map.insert(record.id().to_string(), record.clone());
        let saved = self.write_or_log(collection.key(), &map, "save_record").await;
        if saved {
            debug!(key = collection.key(), id = record.id(), "record saved");
        }
        saved
    }

    pub async fn get_record_by_id<T: DeserializeOwned>(&self, collection: Collection<T>, id: &str) -> Option<T> {
        self.get_collection(collection).await.remove(id)
    }

    /// All records in the collection's listing order. Ties keep id order.
    pub async fn list_all<T: Record + DeserializeOwned>(&self, collection: Collection<T>) -> Vec<T> {
        let mut records: Vec<T> = self.get_collection(collection).await.into_values().collect();
        records.sort_by(T::listing_order);
        records
    }

    /// Remove the record with `id`. Dependent relation entries are left in place.
    pub async fn delete_record<T: Serialize + DeserializeOwned>(&self, collection: Collection<T>, id: &str) -> bool {
        let mut map = self.get_collection(collection).await;
        map.remove(id);
        self.write_or_log(collection.key(), &map, "delete_record").await
    }

    // =========================================================================
    // RELATIONS
    // =========================================================================

    pub async fn get_relation(&self, relation: Relation) -> BTreeMap<String, Vec<String>> {
        self.read_map(relation.key()).await
    }

    /// Add `member` to `owner`'s list. Writes only when the member was new.
    pub async fn add_member(&self, relation: Relation, owner: &str, member: &str) -> bool {
        let mut map = self.get_relation(relation).await;
        let members = map.entry(owner.to_string()).or_default();
        if members.iter().any(|m| m == member) {
            return true;
        }
        members.push(member.to_string());
        self.write_or_log(relation.key(), &map, "add_member").await
    }

    /// Drop `member` from `owner`'s list. Writes only when `owner` has an entry.
    pub async fn remove_member(&self, relation: Relation, owner: &str, member: &str) -> bool {
        let mut map = self.get_relation(relation).await;
        let Some(members) = map.get_mut(owner) else {
            return true;
        };
        members.retain(|m| m != member);
        self.write_or_log(relation.key(), &map, "remove_member").await
    }

    pub async fn members(&self, relation: Relation, owner: &str) -> Vec<String> {
        self.get_relation(relation)
            .await
            .remove(owner)
            .unwrap_or_default()
    }

    pub async fn has_member(&self, relation: Relation, owner: &str, member: &str) -> bool {
        self.members(relation, owner).await.iter().any(|m| m == member)
    }

    /// Registration and like counts for one event.
    ///
    /// Likes are keyed by user, so the like count scans every user's list.
    pub async fn event_stats(&self, event_id: &str) -> EventStats {
        let registrations = self.members(Relation::Registrations, event_id).await.len();
        let likes = self
            .get_relation(Relation::Likes)
            .await
            .values()
            .filter(|liked| liked.iter().any(|id| id == event_id))
            .count();
        EventStats { registrations, likes }
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    pub async fn save_current_user(&self, user: &User) -> bool {
        self.write_or_log(keys::CURRENT_USER, user, "save_current_user").await
    }

    pub async fn get_current_user(&self) -> Option<User> {
        let raw = match self.kv.get(keys::CURRENT_USER).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!(error = %e, "failed to read current user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                error!(error = %e, "malformed current user blob");
                None
            }
        }
    }

    /// Clear the session pointer.
    pub async fn logout(&self) -> bool {
        match self.kv.remove(keys::CURRENT_USER).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to clear current user");
                false
            }
        }
    }

    /// Delete every managed key.
    pub async fn clear_all(&self) -> bool {
        match self.kv.remove_many(&keys::ALL).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to clear store");
                false
            }
        }
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub async fn save_user(&self, user: &User) -> bool {
        self.save_record(Collection::USERS, user).await
    }

    pub async fn get_users(&self) -> UsersMap {
        self.get_collection(Collection::USERS).await
    }

    /// First user whose username matches ignoring case.
    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let wanted = username.to_lowercase();
        self.get_users()
            .await
            .into_values()
            .find(|u| u.username.to_lowercase() == wanted)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    pub async fn save_event(&self, event: &Event) -> bool {
        self.save_record(Collection::EVENTS, event).await
    }

    pub async fn get_events(&self) -> EventsMap {
        self.get_collection(Collection::EVENTS).await
    }

    pub async fn get_event_by_id(&self, event_id: &str) -> Option<Event> {
        self.get_record_by_id(Collection::EVENTS, event_id).await
    }

    /// All events, most recently created first.
    pub async fn get_all_events(&self) -> Vec<Event> {
        self.list_all(Collection::EVENTS).await
    }

    pub async fn delete_event(&self, event_id: &str) -> bool {
        self.delete_record(Collection::EVENTS, event_id).await
    }

    // =========================================================================
    // LIKES
    // =========================================================================

    pub async fn get_likes(&self) -> LikesMap {
        self.get_relation(Relation::Likes).await
    }

    pub async fn like_event(&self, user_id: &str, event_id: &str) -> bool {
        self.add_member(Relation::Likes, user_id, event_id).await
    }

    pub async fn unlike_event(&self, user_id: &str, event_id: &str) -> bool {
        self.remove_member(Relation::Likes, user_id, event_id).await
    }

    pub async fn get_user_likes(&self, user_id: &str) -> Vec<String> {
        self.members(Relation::Likes, user_id).await
    }

    pub async fn is_event_liked(&self, user_id: &str, event_id: &str) -> bool {
        self.has_member(Relation::Likes, user_id, event_id).await
    }

    // =========================================================================
    // REGISTRATIONS
    // =========================================================================

    pub async fn get_registrations(&self) -> RegistrationsMap {
        self.get_relation(Relation::Registrations).await
    }

    pub async fn register_for_event(&self, user_id: &str, event_id: &str) -> bool {
        self.add_member(Relation::Registrations, event_id, user_id).await
    }

    pub async fn unregister_from_event(&self, user_id: &str, event_id: &str) -> bool {
        self.remove_member(Relation::Registrations, event_id, user_id).await
    }

    pub async fn get_event_registrations(&self, event_id: &str) -> Vec<String> {
        self.members(Relation::Registrations, event_id).await
    }

    pub async fn is_user_registered(&self, user_id: &str, event_id: &str) -> bool {
        self.has_member(Relation::Registrations, event_id, user_id).await
    }

    pub async fn get_event_stats(&self, event_id: &str) -> EventStats {
        self.event_stats(event_id).await
    }

    pub async fn clear_all_data(&self) -> bool {
        self.clear_all().await
    }
}


#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
