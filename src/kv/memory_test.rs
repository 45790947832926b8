use super::*;

#[tokio::test]
async fn get_missing_key_is_none() {
    let kv = MemoryKv::new();
    assert_eq!(kv.get("@events").await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get_returns_value() {
    let kv = MemoryKv::new();
    kv.set("@users", "{}").await.unwrap();
    assert_eq!(kv.get("@users").await.unwrap().as_deref(), Some("{}"));
}

#[tokio::test]
async fn set_overwrites_previous_value() {
    let kv = MemoryKv::new();
    kv.set("k", "one").await.unwrap();
    kv.set("k", "two").await.unwrap();
    assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("two"));
    assert_eq!(kv.len().await, 1);
}

#[tokio::test]
async fn remove_absent_key_is_ok() {
    let kv = MemoryKv::new();
    assert!(kv.remove("nope").await.is_ok());
}

#[tokio::test]
async fn remove_many_clears_listed_keys_only() {
    let kv = MemoryKv::new();
    kv.set("a", "1").await.unwrap();
    kv.set("b", "2").await.unwrap();
    kv.set("c", "3").await.unwrap();

    kv.remove_many(&["a", "b", "missing"]).await.unwrap();

    assert_eq!(kv.get("a").await.unwrap(), None);
    assert_eq!(kv.get("b").await.unwrap(), None);
    assert_eq!(kv.get("c").await.unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn new_store_is_empty() {
    let kv = MemoryKv::new();
    assert!(kv.is_empty().await);
}
