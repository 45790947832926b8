use super::test_helpers::{event, memory_store, user};
use super::*;
use crate::kv::MemoryKv;

/// Backend whose every call fails.
struct BrokenKv;

#[async_trait::async_trait]
impl KvStore for BrokenKv {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Unavailable("disk gone".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable("disk gone".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable("disk gone".into()))
    }
}

fn broken_store() -> LocalStore {
    LocalStore::new(Arc::new(BrokenKv))
}

// =============================================================================
// users
// =============================================================================

#[tokio::test]
async fn save_user_then_lookup_by_id() {
    let store = memory_store();
    assert!(store.save_user(&user("u1", "Alice")).await);

    let users = store.get_users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users["u1"].username, "Alice");
    assert_eq!(store.get_record_by_id(Collection::USERS, "u1").await.unwrap().username, "Alice");
}

#[tokio::test]
async fn get_user_by_username_ignores_case() {
    let store = memory_store();
    store.save_user(&user("u1", "Alice")).await;
    store.save_user(&user("u2", "bob")).await;

    assert_eq!(store.get_user_by_username("alice").await.unwrap().id, "u1");
    assert_eq!(store.get_user_by_username("ALICE").await.unwrap().id, "u1");
    assert_eq!(store.get_user_by_username("BoB").await.unwrap().id, "u2");
    assert!(store.get_user_by_username("carol").await.is_none());
}

#[tokio::test]
async fn get_user_by_username_requires_full_match() {
    let store = memory_store();
    store.save_user(&user("u1", "Alice")).await;
    assert!(store.get_user_by_username("ali").await.is_none());
}

// =============================================================================
// events
// =============================================================================

#[tokio::test]
async fn saving_existing_event_id_overwrites_in_place() {
    let store = memory_store();
    store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await;

    let mut edited = event("e1", "u1", "2026-10-01T00:00:00Z");
    edited.title = "Renamed".into();
    assert!(store.save_event(&edited).await);

    let all = store.get_all_events().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Renamed");
}

#[tokio::test]
async fn get_all_events_newest_first() {
    let store = memory_store();
    store.save_event(&event("a", "u1", "2026-10-02T00:00:00Z")).await;
    store.save_event(&event("b", "u1", "2026-10-05T00:00:00Z")).await;
    store.save_event(&event("c", "u1", "2026-10-01T00:00:00Z")).await;

    let ids: Vec<String> = store.get_all_events().await.into_iter().map(|e| e.id).collect();
    assert_eq!(ids, ["b", "a", "c"]);
}

#[tokio::test]
async fn get_event_by_id_missing_is_none() {
    let store = memory_store();
    assert!(store.get_event_by_id("nope").await.is_none());
}

#[tokio::test]
async fn delete_event_leaves_likes_and_registrations_orphaned() {
    let store = memory_store();
    store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await;
    store.like_event("u2", "e1").await;
    store.register_for_event("u2", "e1").await;

    assert!(store.delete_event("e1").await);

    assert!(store.get_all_events().await.is_empty());
    assert_eq!(store.get_user_likes("u2").await, ["e1"]);
    assert_eq!(store.get_event_registrations("e1").await, ["u2"]);
    assert_eq!(store.get_event_stats("e1").await, EventStats { registrations: 1, likes: 1 });
}

#[tokio::test]
async fn delete_missing_event_still_succeeds() {
    let store = memory_store();
    assert!(store.delete_event("ghost").await);
}

// =============================================================================
// likes
// =============================================================================

#[tokio::test]
async fn like_twice_does_not_duplicate() {
    let store = memory_store();
    assert!(store.like_event("u1", "e1").await);
    assert!(store.like_event("u1", "e1").await);
    assert_eq!(store.get_user_likes("u1").await, ["e1"]);
    assert!(store.is_event_liked("u1", "e1").await);
}

#[tokio::test]
async fn like_then_unlike_restores_prior_state() {
    let store = memory_store();
    store.like_event("u1", "e0").await;
    let before = store.get_likes().await;

    store.like_event("u1", "e1").await;
    store.unlike_event("u1", "e1").await;

    assert_eq!(store.get_likes().await, before);
    assert!(!store.is_event_liked("u1", "e1").await);
}

#[tokio::test]
async fn like_then_unlike_from_empty_leaves_no_membership() {
    let store = memory_store();
    assert!(store.like_event("u1", "e1").await);
    assert!(store.unlike_event("u1", "e1").await);

    assert!(!store.is_event_liked("u1", "e1").await);
    assert!(store.get_user_likes("u1").await.is_empty());
    assert_eq!(store.get_event_stats("e1").await.likes, 0);
}

#[tokio::test]
async fn unlike_without_entry_is_noop_success() {
    let store = memory_store();
    assert!(store.unlike_event("u1", "e1").await);
    assert!(store.get_likes().await.is_empty());
}

#[tokio::test]
async fn unlike_last_event_keeps_empty_list() {
    let store = memory_store();
    store.like_event("u1", "e1").await;
    store.unlike_event("u1", "e1").await;

    let likes = store.get_likes().await;
    assert_eq!(likes.get("u1").map(Vec::len), Some(0));
}

// =============================================================================
// registrations and stats
// =============================================================================

#[tokio::test]
async fn register_twice_counts_once() {
    let store = memory_store();
    store.register_for_event("u1", "e1").await;
    assert_eq!(store.get_event_stats("e1").await.registrations, 1);

    store.register_for_event("u1", "e1").await;
    assert_eq!(store.get_event_stats("e1").await.registrations, 1);
    assert!(store.is_user_registered("u1", "e1").await);
}

#[tokio::test]
async fn unregister_removes_membership() {
    let store = memory_store();
    store.register_for_event("u1", "e1").await;
    store.register_for_event("u2", "e1").await;

    assert!(store.unregister_from_event("u1", "e1").await);

    assert_eq!(store.get_event_registrations("e1").await, ["u2"]);
    assert!(!store.is_user_registered("u1", "e1").await);
}

#[tokio::test]
async fn stats_count_likes_across_users() {
    let store = memory_store();
    store.like_event("u1", "e1").await;
    store.like_event("u2", "e1").await;
    store.like_event("u2", "e2").await;
    store.like_event("u3", "e2").await;
    store.register_for_event("u1", "e1").await;

    assert_eq!(store.get_event_stats("e1").await, EventStats { registrations: 1, likes: 2 });
    assert_eq!(store.get_event_stats("e2").await, EventStats { registrations: 0, likes: 2 });
    assert_eq!(store.get_event_stats("e3").await, EventStats::default());
}

// =============================================================================
// session and reset
// =============================================================================

#[tokio::test]
async fn session_round_trip_and_logout() {
    let store = memory_store();
    assert!(store.get_current_user().await.is_none());

    store.save_current_user(&user("u1", "Alice")).await;
    assert_eq!(store.get_current_user().await.unwrap().id, "u1");

    assert!(store.logout().await);
    assert!(store.get_current_user().await.is_none());
}

#[tokio::test]
async fn clear_all_resets_everything() {
    let store = memory_store();
    store.save_user(&user("u1", "Alice")).await;
    store.save_current_user(&user("u1", "Alice")).await;
    store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await;
    store.like_event("u1", "e1").await;
    store.register_for_event("u1", "e1").await;

    assert!(store.clear_all_data().await);

    assert!(store.get_current_user().await.is_none());
    assert!(store.get_all_events().await.is_empty());
    assert!(store.get_users().await.is_empty());
    assert!(store.get_likes().await.is_empty());
    assert!(store.get_registrations().await.is_empty());
}

// =============================================================================
// persisted layout
// =============================================================================

#[tokio::test]
async fn blobs_use_fixed_keys_and_camel_case() {
    let kv = Arc::new(MemoryKv::new());
    let store = LocalStore::new(kv.clone());
    store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await;
    store.like_event("u1", "e1").await;

    let events: serde_json::Value = serde_json::from_str(&kv.get(keys::EVENTS).await.unwrap().unwrap()).unwrap();
    assert_eq!(events["e1"]["creatorId"], "u1");

    let likes: serde_json::Value = serde_json::from_str(&kv.get(keys::LIKES).await.unwrap().unwrap()).unwrap();
    assert_eq!(likes, serde_json::json!({"u1": ["e1"]}));
}

#[tokio::test]
async fn reads_blob_written_by_another_client() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(
        keys::USERS,
        r#"{"123abc":{"id":"123abc","username":"Dana","bio":"Event enthusiast and community builder.","avatar":"https://a","createdAt":"2026-01-01T00:00:00.000Z"}}"#,
    )
    .await
    .unwrap();

    let store = LocalStore::new(kv);
    let dana = store.get_user_by_username("dana").await.unwrap();
    assert_eq!(dana.id, "123abc");
    assert_eq!(dana.avatar.as_deref(), Some("https://a"));
}

// =============================================================================
// failure policy
// =============================================================================

#[tokio::test]
async fn corrupt_blob_reads_as_empty() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(keys::EVENTS, "{not json").await.unwrap();
    kv.set(keys::CURRENT_USER, "[]").await.unwrap();
    let store = LocalStore::new(kv);

    assert!(store.get_events().await.is_empty());
    assert!(store.get_current_user().await.is_none());
}

#[tokio::test]
async fn write_over_corrupt_blob_replaces_it() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(keys::EVENTS, "garbage").await.unwrap();
    let store = LocalStore::new(kv);

    assert!(store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await);
    assert_eq!(store.get_all_events().await.len(), 1);
}

#[tokio::test]
async fn broken_backend_yields_neutral_values() {
    let store = broken_store();

    assert!(store.get_users().await.is_empty());
    assert!(store.get_event_by_id("e1").await.is_none());
    assert!(store.get_all_events().await.is_empty());
    assert!(store.get_current_user().await.is_none());
    assert!(store.get_user_likes("u1").await.is_empty());
    assert!(!store.is_user_registered("u1", "e1").await);
    assert_eq!(store.get_event_stats("e1").await, EventStats::default());
}

#[tokio::test]
async fn broken_backend_writes_report_false() {
    let store = broken_store();

    assert!(!store.save_user(&user("u1", "Alice")).await);
    assert!(!store.save_event(&event("e1", "u1", "2026-10-01T00:00:00Z")).await);
    assert!(!store.delete_event("e1").await);
    assert!(!store.like_event("u1", "e1").await);
    assert!(!store.register_for_event("u1", "e1").await);
    assert!(!store.save_current_user(&user("u1", "Alice")).await);
    assert!(!store.logout().await);
    assert!(!store.clear_all().await);
}

#[test]
fn relation_and_collection_keys() {
    assert_eq!(Relation::Likes.key(), "@likes");
    assert_eq!(Relation::Registrations.key(), "@registrations");
    assert_eq!(Collection::USERS.key(), "@users");
    assert_eq!(Collection::EVENTS.key(), "@events");
    assert_eq!(keys::ALL.len(), 5);
}
