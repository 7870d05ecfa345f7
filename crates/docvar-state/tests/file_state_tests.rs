//! State store over a file backend

use docvar_state::{FileStorage, StateError, StateStore};
use pretty_assertions::assert_eq;

#[test]
fn values_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut store = StateStore::new(Box::new(FileStorage::open(&path).unwrap()));
        store.store_text("HOST", "example.com").unwrap();
        store.store_checked("TLS", true).unwrap();
        store.store_index("PROTOCOL", 2, 3).unwrap();
        store.store_bool_setting("INLINE_EDITORS", false).unwrap();
    }

    let store = StateStore::new(Box::new(FileStorage::open(&path).unwrap()));
    assert_eq!(store.load_text("HOST").as_deref(), Some("example.com"));
    assert_eq!(store.load_checked("TLS"), Some(true));
    assert_eq!(store.load_index("PROTOCOL", 3), Some(2));
    assert_eq!(store.load_bool_setting("INLINE_EDITORS"), Some(false));
}

#[test]
fn reset_clears_file_but_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = StateStore::new(Box::new(FileStorage::open(&path).unwrap()));
    store.store_text("HOST", "example.com").unwrap();
    store.store_bool_setting("INLINE_EDITORS", true).unwrap();
    assert_eq!(store.clear_placeholders().unwrap(), 1);

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "PLACEHOLDER_SETTINGS_INLINE_EDITORS": "1" })
    );
}

#[test]
fn out_of_range_store_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = StateStore::new(Box::new(FileStorage::open(&path).unwrap()));
    let err = store.store_index("PROTOCOL", 5, 3).unwrap_err();
    assert!(matches!(err, StateError::IndexOutOfRange { .. }));
    assert!(!path.exists());
}
