//! Resume Session Example for client-session-seaorm-store
//!
//! Opens (or creates) a session in a SQLite store file, pretends to
//! authenticate on first run, caches an entity, exports a backup and lists
//! every session in the file.
//!
//! # Running the example
//!
//! ```bash
//! export SESSION_STORE_PATH=data/sessions.db
//! export SESSION_NAME=main
//! RUST_LOG=client_session_seaorm_store=debug cargo run --example resume_session
//! ```
//!
//! Run it twice: the second run finds the stored key and skips the handshake.

use std::env;
use std::sync::Arc;

use client_session_seaorm_store::{registry, RawAuthKey, SessionController, StoreOptions};
use dotenvy::dotenv;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    // Load environment variables from .env file if present
    dotenv().ok();

    let store_path = env::var("SESSION_STORE_PATH").unwrap_or_else(|_| "data/sessions.db".into());
    let name = env::var("SESSION_NAME").unwrap_or_else(|_| "main".into());

    let mut session = SessionController::<RawAuthKey>::new(&store_path, &name)
        .with_store_options(StoreOptions::default().with_sqlx_logging(false));
    session.load().await?;

    if session.auth_key().is_some() {
        info!(dc_id = ?session.dc_id(), "resumed stored session");
    } else {
        info!("no stored key, authenticating");
        // A real client performs the protocol handshake here.
        session.set_data_center(2, "149.154.167.40", 443).await?;
        session
            .set_auth_key(Some(RawAuthKey::new(vec![0x5a; 256])))
            .await?;
    }

    session
        .set_entity(777000, Arc::new(json!({ "first_name": "Service", "bot": false })))
        .await?;

    let backup = session
        .export_to_file(format!("data/backups/{name}.json"))
        .await?;
    info!(path = %backup.display(), "wrote backup");

    let summary = session.get_info();
    info!(
        name = %summary.name,
        has_auth = summary.has_auth,
        entities = summary.entities_count,
        "session ready"
    );
    session.close().await?;

    for stored in registry::list_sessions(&store_path).await? {
        info!(name = %stored.name, created_at = %stored.created_at, "stored session");
    }

    Ok(())
}
