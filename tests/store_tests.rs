use std::time::Duration;

use solo::store::{KvStore, MemoryStore};

const TTL: Duration = Duration::from_secs(60);

#[solo::test]
async fn put_if_absent_creates_then_reports_existing() {
    let store = MemoryStore::new();
    assert_eq!(store.put_if_absent("k", "first", TTL).await.unwrap(), None);
    assert_eq!(
        store.put_if_absent("k", "second", TTL).await.unwrap(),
        Some("first".to_string())
    );
    // The losing write modified nothing.
    assert_eq!(store.get("k").await.unwrap(), Some("first".to_string()));
}

#[solo::test]
async fn get_absent_returns_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("missing").await.unwrap(), None);
}

#[solo::test]
async fn put_overwrites_unconditionally() {
    let store = MemoryStore::new();
    store.put("k", "1", TTL).await.unwrap();
    store.put("k", "2", TTL).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
}

#[solo::test]
async fn delete_is_idempotent_and_takes_many_keys() {
    let store = MemoryStore::new();
    store.put("a", "1", TTL).await.unwrap();
    store.put("b", "2", TTL).await.unwrap();
    let keys = vec!["a".to_string(), "b".to_string(), "never-existed".to_string()];
    store.delete(&keys).await.unwrap();
    store.delete(&keys).await.unwrap();
    assert!(store.live_keys().is_empty());
}

#[solo::test]
async fn expired_entries_are_treated_as_absent() {
    let store = MemoryStore::new();
    store.put_if_absent("k", "old", TTL).await.unwrap();
    store.force_expire("k");
    assert_eq!(store.get("k").await.unwrap(), None);
    // A new holder can claim the key once the old entry lapsed.
    assert_eq!(store.put_if_absent("k", "new", TTL).await.unwrap(), None);
    assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
}

#[solo::test(flavor = "multi_thread")]
async fn concurrent_put_if_absent_admits_exactly_one() {
    let store = MemoryStore::new_arc();
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .put_if_absent("contested", &format!("holder-{i}"), TTL)
                .await
                .unwrap()
        }));
    }
    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_none() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
