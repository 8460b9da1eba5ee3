use std::path::PathBuf;
use std::time::Duration;

use client_session_seaorm_store::{SessionFields, SqliteStore};
use tempfile::TempDir;

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("sessions.db")
}

fn routed_fields(dc_id: i32) -> SessionFields {
    SessionFields {
        dc_id: Some(dc_id),
        server_address: Some("149.154.167.50".to_string()),
        port: Some(443),
        ..Default::default()
    }
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();

    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();
    store.close().await.unwrap();

    // Reopening runs ensure_schema against the existing table.
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();
    assert!(store.load_row("main").await.unwrap().is_none());
}

#[tokio::test]
async fn open_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("sessions.db");

    let store = SqliteStore::open(&path).await.unwrap();
    store.close().await.unwrap();

    assert!(path.exists());
}

#[tokio::test]
async fn save_row_inserts_then_replaces_all_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();

    store
        .save_row(
            "main",
            SessionFields {
                auth_key: Some(vec![1, 2, 3]),
                entities: Some("{}".to_string()),
                ..routed_fields(2)
            },
        )
        .await
        .unwrap();
    store.save_row("main", SessionFields::default()).await.unwrap();

    let row = store.load_row("main").await.unwrap().expect("row should exist");
    assert_eq!(row.auth_key, None);
    assert_eq!(row.dc_id, None);
    assert_eq!(row.server_address, None);
    assert_eq!(row.port, None);
    assert_eq!(row.entities, None);
}

#[tokio::test]
async fn upsert_refreshes_updated_at_and_keeps_created_at() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();

    store.save_row("main", routed_fields(2)).await.unwrap();
    let first = store.load_row("main").await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    store.save_row("main", routed_fields(4)).await.unwrap();
    let second = store.load_row("main").await.unwrap().unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.dc_id, Some(4));
}

#[tokio::test]
async fn names_are_independent_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();

    store.save_row("alice", routed_fields(1)).await.unwrap();
    store.save_row("bob", routed_fields(5)).await.unwrap();

    assert_eq!(store.load_row("alice").await.unwrap().unwrap().dc_id, Some(1));
    assert_eq!(store.load_row("bob").await.unwrap().unwrap().dc_id, Some(5));
}

#[tokio::test]
async fn delete_row_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();
    store.save_row("keep", routed_fields(2)).await.unwrap();

    store.delete_row("missing").await.unwrap();
    store.delete_row("missing").await.unwrap();

    let rows = store.list_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "keep");
}

#[tokio::test]
async fn list_rows_is_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(store_path(&dir)).await.unwrap();

    for name in ["t1", "t2", "t3"] {
        store.save_row(name, routed_fields(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Updating the oldest row must not move it.
    store.save_row("t1", routed_fields(3)).await.unwrap();

    let names: Vec<String> = store
        .list_rows()
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert_eq!(names, ["t3", "t2", "t1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_handles_save_the_same_row() {
    let dir = tempfile::tempdir().unwrap();
    let first = SqliteStore::open(store_path(&dir)).await.unwrap();
    let second = SqliteStore::open(store_path(&dir)).await.unwrap();

    for round in 0..50 {
        let (a, b) = tokio::join!(
            first.save_row("main", routed_fields(2)),
            second.save_row("main", routed_fields(4)),
        );
        a.unwrap_or_else(|e| panic!("first handle failed in round {round}: {e}"));
        b.unwrap_or_else(|e| panic!("second handle failed in round {round}: {e}"));
    }

    let rows = first.list_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    let dc_id = first.load_row("main").await.unwrap().unwrap().dc_id;
    assert!(matches!(dc_id, Some(2) | Some(4)));
}

#[tokio::test]
async fn open_takes_url_characters_in_path_literally() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("what?ever").join("100%41done").join("sessions#1.db");

    let store = SqliteStore::open(&path).await.unwrap();
    store.save_row("main", routed_fields(2)).await.unwrap();
    store.close().await.unwrap();

    assert!(path.is_file());
    assert!(!dir.path().join("what").exists());

    let store = SqliteStore::open(&path).await.unwrap();
    assert_eq!(store.load_row("main").await.unwrap().unwrap().dc_id, Some(2));
}
