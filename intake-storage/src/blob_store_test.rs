//! Unit tests for FsBlobStore.

use crate::blob_store::FsBlobStore;
use intake_core::BlobStore;

#[tokio::test]
async fn put_creates_nested_path() {
    let dir = tempfile::tempdir().expect("Failed to create tempdir");
    let store = FsBlobStore::new(dir.path());

    store
        .put("789/no_media_group/4/test.pdf", b"pdf bytes")
        .await
        .expect("Failed to put");

    let stored = std::fs::read(dir.path().join("789/no_media_group/4/test.pdf"))
        .expect("Failed to read back");
    assert_eq!(stored, b"pdf bytes");
}

#[tokio::test]
async fn same_key_overwrites() {
    let dir = tempfile::tempdir().expect("Failed to create tempdir");
    let store = FsBlobStore::new(dir.path());

    store.put("789/g/1/a.jpg", b"first").await.expect("Failed to put");
    store.put("789/g/1/a.jpg", b"second").await.expect("Failed to put");

    let stored = std::fs::read(dir.path().join("789/g/1/a.jpg")).expect("Failed to read back");
    assert_eq!(stored, b"second");
}

#[tokio::test]
async fn escaping_keys_are_refused() {
    let dir = tempfile::tempdir().expect("Failed to create tempdir");
    let store = FsBlobStore::new(dir.path());

    assert!(store.put("../outside", b"x").await.is_err());
    assert!(store.put("/abs/path", b"x").await.is_err());
    assert!(store.put("", b"x").await.is_err());
}
