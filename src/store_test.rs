use super::*;

#[test]
fn new_store_is_empty() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    assert_eq!(store.keys().unwrap(), Vec::<String>::new());
}

#[test]
fn set_then_get() {
    let mut store = MemoryStore::new();
    store.set("a", "1").unwrap();
    assert_eq!(store.get("a").unwrap(), Some("1".to_owned()));
    assert_eq!(store.get("b").unwrap(), None);
}

#[test]
fn set_replaces_in_place() {
    let mut store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
    store.set("a", "3").unwrap();
    assert_eq!(store.keys().unwrap(), vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(store.get("a").unwrap(), Some("3".to_owned()));
    assert_eq!(store.len(), 2);
}

#[test]
fn keys_follow_insertion_order() {
    let store = MemoryStore::with_entries([("z", ""), ("a", ""), ("m", "")]);
    assert_eq!(store.keys().unwrap(), vec!["z".to_owned(), "a".to_owned(), "m".to_owned()]);
}

#[test]
fn remove_deletes_and_tolerates_absent_keys() {
    let mut store = MemoryStore::with_entries([("a", "1")]);
    store.remove("a").unwrap();
    store.remove("a").unwrap();
    assert!(store.is_empty());
}

#[test]
fn contains_reflects_presence() {
    let store = MemoryStore::with_entries([("a", "")]);
    assert!(store.contains("a").unwrap());
    assert!(!store.contains("b").unwrap());
}

#[test]
fn store_error_messages() {
    assert_eq!(StoreError::Unavailable.to_string(), "storage unavailable");
    assert_eq!(StoreError::Backend("QuotaExceededError".to_owned()).to_string(), "storage backend error: QuotaExceededError");
}
