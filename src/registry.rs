//! Administrative operations over a store file, without a live controller.
//!
//! Each function opens its own handle, does one thing and closes it again.

use std::path::Path;

use time::OffsetDateTime;
use tracing::info;

use crate::error::Result;
use crate::store::{SessionSummary, SqliteStore};

/// Existence and timestamps of a named session.
///
/// Both timestamps are `None` exactly when `exists` is `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub exists: bool,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Checks whether a session named `name` is stored in the file at `path`.
///
/// A missing store file is created empty, so a fresh path reports `false`.
///
/// # Examples
///
/// ```no_run
/// use client_session_seaorm_store::registry;
///
/// # async fn example() -> client_session_seaorm_store::Result<()> {
/// if !registry::exists("data/sessions.db", "main").await? {
///     println!("no stored session, log in first");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn exists(path: impl AsRef<Path>, name: &str) -> Result<bool> {
    Ok(info(path, name).await?.exists)
}

/// Reports whether `name` is stored and when it was created and last written.
///
/// # Returns
///
/// * `Ok(SessionInfo)` - With `exists: false` and no timestamps for an unknown name.
/// * `Err(Error::Store)` - The file could not be opened or queried.
pub async fn info(path: impl AsRef<Path>, name: &str) -> Result<SessionInfo> {
    let store = SqliteStore::open(path).await?;
    let row = store.load_row(name).await;
    store.close().await?;

    Ok(match row?.map(SessionSummary::from) {
        Some(summary) => SessionInfo {
            exists: true,
            created_at: Some(summary.created_at),
            updated_at: Some(summary.updated_at),
        },
        None => SessionInfo {
            exists: false,
            created_at: None,
            updated_at: None,
        },
    })
}

/// Removes a named session. Deleting a name that is not stored is a no-op.
pub async fn delete_session(path: impl AsRef<Path>, name: &str) -> Result<()> {
    let store = SqliteStore::open(path).await?;
    let deleted = store.delete_row(name).await;
    store.close().await?;
    deleted?;

    info!(session = %name, "deleted session");
    Ok(())
}

/// Lists every session in the file, newest first.
pub async fn list_sessions(path: impl AsRef<Path>) -> Result<Vec<SessionSummary>> {
    let store = SqliteStore::open(path).await?;
    let rows = store.list_rows().await;
    store.close().await?;
    rows
}
