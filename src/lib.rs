//! # Durable Client Sessions for Sea-ORM with SQLite
//!
//! Persists the authentication and entity-cache state of a messaging-protocol
//! client session in a SQLite file, so a process can resume a previously
//! authenticated connection after a restart instead of logging in again.
//!
//! The crate sits between the host client library's in-memory session and a
//! relational store reached through [Sea-ORM](https://crates.io/crates/sea-orm).
//!
//! ## Features
//!
//! - One `sessions` table per store file, one row per session name
//! - Lazy, load-once reads and write-through saves on every mutation
//! - Identity-keyed entity cache persisted as a JSON column
//! - Pretty-printed JSON export and import of a whole session
//! - Stateless registry functions to list, inspect and delete sessions
//! - Optional `sea-orm-migration` migrator (feature `migration`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use client_session_seaorm_store::{RawAuthKey, SessionController};
//!
//! # async fn example() -> client_session_seaorm_store::Result<()> {
//! let mut session = SessionController::<RawAuthKey>::new("data/sessions.db", "main");
//!
//! // Pull whatever was stored under "main" (nothing on first run).
//! session.load().await?;
//!
//! if session.auth_key().is_none() {
//!     // ... perform the protocol handshake, then:
//!     session.set_data_center(2, "149.154.167.40", 443).await?;
//!     session.set_auth_key(Some(RawAuthKey::new(vec![0u8; 256]))).await?;
//! }
//!
//! let info = session.get_info();
//! println!("{} on dc {:?}, {} cached entities", info.name, info.dc_id, info.entities_count);
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Moving a Session Between Files
//!
//! ```no_run
//! use client_session_seaorm_store::{RawAuthKey, SessionController};
//!
//! # async fn example() -> client_session_seaorm_store::Result<()> {
//! let mut source = SessionController::<RawAuthKey>::new("old.db", "main");
//! source.load().await?;
//! source.export_to_file("backup/main.json").await?;
//!
//! let mut target = SessionController::<RawAuthKey>::new("new.db", "main");
//! target.import_from_file("backup/main.json").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Administration
//!
//! ```no_run
//! use client_session_seaorm_store::registry;
//!
//! # async fn example() -> client_session_seaorm_store::Result<()> {
//! for session in registry::list_sessions("data/sessions.db").await? {
//!     println!("{} (updated {})", session.name, session.updated_at);
//! }
//! registry::delete_session("data/sessions.db", "stale").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth_key;
pub mod cache;
pub mod codec;
mod controller;
pub mod entity;
mod error;
#[cfg(feature = "migration")]
pub mod migration;
mod record;
pub mod registry;
mod schema;
pub mod storage;
mod store;

/// The durable, write-through session controller.
///
/// This is the primary type you'll use from this crate.
pub use controller::{ControllerInfo, SessionController};

/// The credential seam and its plain byte-vector implementation.
pub use auth_key::{AuthKey, RawAuthKey};

/// Identity-keyed entity cache.
pub use cache::EntityCache;

/// Exported session document.
pub use codec::SessionDocument;

/// Error and result types shared by every operation.
pub use error::{Error, Result};

/// In-memory session state and the port assumed when none is stored.
pub use record::{SessionRecord, DEFAULT_PORT};

/// Registry result type.
pub use registry::SessionInfo;

/// Entity-access trait and its in-memory implementation.
pub use storage::{EntityStorage, MemorySession};

/// The store adapter and its row types.
pub use store::{SessionFields, SessionRow, SessionSummary, SqliteStore, StoreOptions};
