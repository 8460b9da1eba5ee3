#![cfg(feature = "migration")]

use client_session_seaorm_store::migration::{Migrator, MigratorTrait};
use client_session_seaorm_store::{RawAuthKey, SessionController, SqliteStore, StoreOptions};

#[tokio::test]
async fn migrated_store_is_usable_by_controller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let conn = SqliteStore::connect(&path, &StoreOptions::default())
        .await
        .unwrap();
    Migrator::up(&conn, None).await.unwrap();
    conn.close().await.unwrap();

    let mut session = SessionController::<RawAuthKey>::new(&path, "main");
    session.load().await.unwrap();
    session.set_data_center(2, "149.154.167.40", 443).await.unwrap();
    session.close().await.unwrap();

    let conn = SqliteStore::connect(&path, &StoreOptions::default())
        .await
        .unwrap();
    Migrator::down(&conn, None).await.unwrap();
    conn.close().await.unwrap();
}
