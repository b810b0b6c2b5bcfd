//! SQLite store unit tests

use crate::db::{queries, SqliteStore};
use crate::store::KeyValueStore;

#[tokio::test]
async fn test_sqlite_store_upsert_overwrites() {
    let store = SqliteStore::open_in_memory().expect("in-memory DB");

    store.set("contentsync.session_id", "a").await.unwrap();
    store.set("contentsync.session_id", "b").await.unwrap();

    assert_eq!(
        store.get("contentsync.session_id").await.unwrap().as_deref(),
        Some("b")
    );
    assert_eq!(queries::count_values(store.database()).unwrap(), 1);
}

#[tokio::test]
async fn test_sqlite_store_remove_missing_key_is_ok() {
    let store = SqliteStore::open_in_memory().expect("in-memory DB");
    store.remove("never-written").await.unwrap();
    assert!(store.get("never-written").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contentsync.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.set("k", "[1,2,3]").await.unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("[1,2,3]"));
}

#[test]
fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.db");
    SqliteStore::open(&path).unwrap();
    let store = SqliteStore::open(&path).unwrap();
    let applied: i64 = store
        .database()
        .conn()
        .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn test_sqlite_store_does_not_block_the_runtime() {
    let store = std::sync::Arc::new(SqliteStore::open_in_memory().unwrap());
    store.set("k", "v").await.unwrap();

    // Hold the connection as a slow disk would.
    let guard = store.database().conn();
    let reader = tokio::spawn({
        let store = store.clone();
        async move { store.get("k").await }
    });

    // The single-threaded runtime keeps ticking while the read waits.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!reader.is_finished());

    drop(guard);
    assert_eq!(reader.await.unwrap().unwrap().as_deref(), Some("v"));
}
