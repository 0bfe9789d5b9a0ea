use dashstore::model::Document;
use dashstore::store::{FsBackend, StorageBackend};
use dashstore::{CollectionStore, CreateOptions, DocId, ErrorKind};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("data"));
    (dir, backend)
}

fn doc(value: serde_json::Value) -> Document {
    Document::from_value(value).unwrap()
}

#[test]
fn test_fs_backend_basic_collection_io() {
    let (_dir, backend) = setup();

    // 1. Absent
    assert_eq!(backend.load_collection("rebels-ranking").unwrap(), None);

    // 2. Write
    let docs = vec![doc(json!({"id": 1, "name": "KRIMSON"}))];
    backend.save_collection("rebels-ranking", &docs).unwrap();

    // 3. Read
    assert_eq!(
        backend.load_collection("rebels-ranking").unwrap(),
        Some(docs)
    );
}

#[test]
fn test_fs_backend_atomic_write_artifacts() {
    let (dir, backend) = setup();
    backend
        .save_collection("notifications", &[doc(json!({"id": "notif-1"}))])
        .unwrap();
    backend
        .save_collection("notifications", &[doc(json!({"id": "notif-2"}))])
        .unwrap();

    let expected_path = dir.path().join("data").join("notifications.json");
    assert!(expected_path.exists());
    let on_disk = fs::read_to_string(&expected_path).unwrap();
    assert!(on_disk.contains("notif-2"));
    assert!(!on_disk.contains("notif-1"));

    // Verify NO .tmp files are left behind
    for entry in fs::read_dir(dir.path().join("data")).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_fs_backend_corrupt_file_is_reported() {
    let (dir, backend) = setup();
    backend.ensure_ready().unwrap();
    let path = dir.path().join("data").join("dashboard-stats.json");
    fs::write(&path, "[{\"label\": \"ISSUES").unwrap();

    let err = backend.load_collection("dashboard-stats").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CorruptData);
    assert!(err.to_string().contains("dashboard-stats.json"));
}

#[test]
fn test_fs_backend_lists_collections() {
    let (dir, backend) = setup();
    assert!(backend.collection_names().unwrap().is_empty());

    backend.save_collection("rebels-ranking", &[]).unwrap();
    backend.save_collection("notifications", &[]).unwrap();
    fs::write(dir.path().join("data").join("README.txt"), "x").unwrap();

    assert_eq!(
        backend.collection_names().unwrap(),
        vec!["notifications", "rebels-ranking"]
    );
}

#[test]
fn test_ensure_ready_is_idempotent() {
    let (dir, backend) = setup();
    backend.ensure_ready().unwrap();
    backend.ensure_ready().unwrap();
    assert!(dir.path().join("data").is_dir());
}

#[test]
fn test_store_bootstrap_creates_directory_and_file() {
    let (dir, backend) = setup();
    let store = CollectionStore::with_backend(backend);
    let default = vec![doc(json!({"id": 1}))];

    let docs = store.read("rebels-ranking", &default).unwrap();

    assert_eq!(docs, default);
    assert!(dir.path().join("data").join("rebels-ranking.json").exists());

    let again = store
        .read("rebels-ranking", &[doc(json!({"id": 99}))])
        .unwrap();
    assert_eq!(again, default);
}

#[test]
fn test_delete_missing_id_leaves_file_byte_for_byte() {
    let (dir, backend) = setup();
    let store = CollectionStore::with_backend(backend);
    store
        .write("rebels-ranking", &[doc(json!({"id": 1})), doc(json!({"id": 2}))])
        .unwrap();
    let path = dir.path().join("data").join("rebels-ranking.json");
    let before = fs::read(&path).unwrap();

    let err = store.delete("rebels-ranking", &DocId::Int(3)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_hand_written_file_is_readable() {
    let (dir, backend) = setup();
    backend.ensure_ready().unwrap();
    fs::write(
        dir.path().join("data").join("notifications.json"),
        r#"[
  {"id": "notif-9", "title": "HELLO", "read": false}
]"#,
    )
    .unwrap();
    let store = CollectionStore::with_backend(backend);

    let found = store
        .get_by_id("notifications", &DocId::from("notif-9"))
        .unwrap();

    assert_eq!(found.get("title"), Some(&json!("HELLO")));
}

#[test]
fn test_lock_file_is_hidden_from_collection_names() {
    let (dir, backend) = setup();
    let store = CollectionStore::with_backend(backend);
    store
        .create("rebels-ranking", doc(json!({"name": "NEO"})), CreateOptions::numeric())
        .unwrap();

    assert!(dir.path().join("data").join(".rebels-ranking.lock").exists());
    assert_eq!(store.collection_names().unwrap(), vec!["rebels-ranking"]);
}

#[test]
fn test_held_lock_file_blocks_other_store_with_conflict() {
    let (dir, backend) = setup();
    let guard = backend
        .lock_collection("rebels-ranking", Duration::from_millis(50))
        .unwrap();
    assert!(guard.is_held());

    // A second store on the same directory shares no in-process state.
    let other = CollectionStore::with_backend(FsBackend::new(dir.path().join("data")))
        .with_lock_timeout(Duration::from_millis(50));
    let err = other
        .create("rebels-ranking", doc(json!({"name": "NEO"})), CreateOptions::numeric())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(!dir.path().join("data").join("rebels-ranking.json").exists());

    // Other collections proceed.
    other
        .create("notifications", doc(json!({"id": "n"})), CreateOptions::text())
        .unwrap();

    drop(guard);
    other
        .create("rebels-ranking", doc(json!({"name": "NEO"})), CreateOptions::numeric())
        .unwrap();
}
