//! Database entity models for client-session-seaorm-store.
//!
//! The only table is `sessions`: one row per named session, all names in a
//! store file sharing the same table.

/// Session entity model for Sea-ORM database interaction.
pub mod session;
