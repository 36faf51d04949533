use super::*;

#[test]
fn memory_set_get_remove() {
    let store = MemoryStorage::new();
    assert_eq!(store.get(AUTH_KEY).unwrap(), None);
    store.set(AUTH_KEY, "abc").unwrap();
    assert_eq!(store.get(AUTH_KEY).unwrap().as_deref(), Some("abc"));
    store.set(AUTH_KEY, "def").unwrap();
    assert_eq!(store.get(AUTH_KEY).unwrap().as_deref(), Some("def"));
    assert_eq!(store.len(), 1);
    store.remove(AUTH_KEY).unwrap();
    assert!(store.is_empty());
    // removing an absent key is not an error
    store.remove(AUTH_KEY).unwrap();
}

#[test]
fn memory_clones_share_state() {
    let a = MemoryStorage::new();
    let b = a.clone();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn file_storage_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("slots.json");
    {
        let store = FileStorage::open(&path).unwrap();
        store.set(AUTH_KEY, r#"{"email":"john@mail.com","roles":["admin"]}"#).unwrap();
        store.set("other", "x").unwrap();
    }
    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
    let raw = reopened.get(AUTH_KEY).unwrap().unwrap();
    assert!(raw.contains("john@mail.com"));

    reopened.remove(AUTH_KEY).unwrap();
    let again = FileStorage::open(&path).unwrap();
    assert_eq!(again.get(AUTH_KEY).unwrap(), None);
    assert_eq!(again.get("other").unwrap().as_deref(), Some("x"));
}

#[test]
fn file_storage_treats_corrupt_document_as_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("slots.json");
    std::fs::write(&path, b"not json").unwrap();
    let store = FileStorage::open(&path).unwrap();
    assert_eq!(store.get(AUTH_KEY).unwrap(), None);
    store.set(AUTH_KEY, "tok").unwrap();
    assert_eq!(FileStorage::open(&path).unwrap().get(AUTH_KEY).unwrap().as_deref(), Some("tok"));
}

#[test]
fn failed_file_write_leaves_cache_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("slots.json");
    let store = FileStorage::open(&path).unwrap();
    store.set(AUTH_KEY, "kept").unwrap();

    // a non-empty directory in place of the document makes the rename fail
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("blocker"), b"x").unwrap();

    assert!(store.set(AUTH_KEY, "lost").is_err());
    assert_eq!(store.get(AUTH_KEY).unwrap().as_deref(), Some("kept"));
    assert!(store.set("other", "lost").is_err());
    assert_eq!(store.get("other").unwrap(), None);
    assert!(store.remove(AUTH_KEY).is_err());
    assert_eq!(store.get(AUTH_KEY).unwrap().as_deref(), Some("kept"));
}
