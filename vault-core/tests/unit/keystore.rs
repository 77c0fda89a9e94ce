use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use vault_core::domain::{KeyAlgorithm, KeyStatus};
use vault_core::foundation::{ErrorCode, KeyId};
use vault_core::infrastructure::crypto::EcdsaKeyPair;
use vault_core::infrastructure::keystore::{KeyEntry, KeyStore, MemoryStore};

fn sample_entry(id: &str, status: KeyStatus) -> KeyEntry {
    let mut labels = BTreeMap::new();
    labels.insert("env".to_string(), "test".to_string());
    KeyEntry {
        id: KeyId::from(id),
        algorithm: KeyAlgorithm::EcdsaP256,
        status,
        key_pair: EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP256),
        created_at: Utc::now(),
        rotated_at: None,
        labels,
    }
}

#[test]
fn put_then_get_returns_the_entry() {
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Active)).expect("put");

    let entry = store.get(&KeyId::from("k-1")).expect("get");
    assert_eq!(entry.id.as_str(), "k-1");
    assert_eq!(entry.status, KeyStatus::Active);
    assert_eq!(entry.labels.get("env").map(String::as_str), Some("test"));
}

#[test]
fn duplicate_put_fails_once() {
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Active)).expect("first put");

    let err = store.put(sample_entry("k-1", KeyStatus::Active)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyAlreadyExists);
}

#[test]
fn get_unknown_id_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get(&KeyId::from("missing")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotFound);
}

#[test]
fn list_honors_the_status_filter() {
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Active)).expect("put");
    store.put(sample_entry("k-2", KeyStatus::Rotated)).expect("put");
    store.put(sample_entry("k-3", KeyStatus::Deactivated)).expect("put");

    assert_eq!(store.list(None).expect("list").len(), 3);
    let active = store.list(Some(KeyStatus::Active)).expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id.as_str(), "k-1");
    assert_eq!(store.list(Some(KeyStatus::Deactivated)).expect("list").len(), 1);
}

#[test]
fn update_status_returns_the_updated_snapshot() {
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Active)).expect("put");

    let updated = store.update_status(&KeyId::from("k-1"), KeyStatus::Rotated).expect("update");
    assert_eq!(updated.status, KeyStatus::Rotated);
    assert!(updated.rotated_at.is_some());

    // The stamp survives the next transition.
    let deactivated = store.update_status(&KeyId::from("k-1"), KeyStatus::Deactivated).expect("update");
    assert_eq!(deactivated.rotated_at, updated.rotated_at);

    let read_back = store.get(&KeyId::from("k-1")).expect("get");
    assert_eq!(read_back.status, KeyStatus::Deactivated);
}

#[test]
fn update_status_on_unknown_id_is_not_found() {
    let store = MemoryStore::new();
    let err = store.update_status(&KeyId::from("missing"), KeyStatus::Rotated).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotFound);
}

#[test]
fn store_accepts_arbitrary_transitions() {
    // Monotonicity is a facade rule; storage stays permissive so tests can
    // pre-seed any state.
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Deactivated)).expect("put");
    let entry = store.update_status(&KeyId::from("k-1"), KeyStatus::Active).expect("update");
    assert_eq!(entry.status, KeyStatus::Active);
}

#[test]
fn delete_removes_the_entry() {
    let store = MemoryStore::new();
    store.put(sample_entry("k-1", KeyStatus::Active)).expect("put");
    store.delete(&KeyId::from("k-1")).expect("delete");

    assert_eq!(store.get(&KeyId::from("k-1")).unwrap_err().code(), ErrorCode::KeyNotFound);
    assert_eq!(store.delete(&KeyId::from("k-1")).unwrap_err().code(), ErrorCode::KeyNotFound);
}

#[test]
fn concurrent_disjoint_writers_and_readers() {
    let store = Arc::new(MemoryStore::new());
    let writers: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for j in 0..16 {
                    store.put(sample_entry(&format!("k-{i}-{j}"), KeyStatus::Active)).expect("put");
                }
            })
        })
        .collect();
    for handle in writers {
        handle.join().expect("writer thread");
    }

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.list(None).expect("list").len())
        })
        .collect();
    for handle in readers {
        assert_eq!(handle.join().expect("reader thread"), 8 * 16);
    }
}
