//! Session entity model for Sea-ORM database interaction.
//!
//! This module defines the database schema representation for durable
//! client sessions. It provides the Sea-ORM entity definition that maps to
//! the `sessions` table inside one SQLite store file.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one named session in the store file.
///
/// # Database Schema
///
/// | Column         | Type                        | Description                              |
/// |----------------|-----------------------------|------------------------------------------|
/// | id             | INTEGER (Primary Key)       | Autoincrement row identity               |
/// | name           | TEXT (Unique)               | Logical session name                     |
/// | auth_key       | BLOB, nullable              | Raw credential bytes                     |
/// | dc_id          | INTEGER, nullable           | Data-center identifier                   |
/// | server_address | TEXT, nullable              | Data-center address                      |
/// | port           | INTEGER, nullable           | Data-center port                         |
/// | entities       | TEXT, nullable              | JSON object of cached entities           |
/// | created_at     | TIMESTAMP                   | Set once when the row is inserted        |
/// | updated_at     | TIMESTAMP                   | Refreshed on every write                 |
///
/// This entity is used internally by [`SqliteStore`](crate::SqliteStore); the
/// controller and registry are the intended entry points.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Autoincrement row identity. Never exported.
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The logical session name, unique within one store file.
    #[sea_orm(unique, column_type = "Text")]
    pub name: String,

    /// Serialized credential bytes, `None` when the session never authenticated.
    pub auth_key: Option<Vec<u8>>,

    pub dc_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub server_address: Option<String>,

    pub port: Option<i32>,

    /// JSON object keyed by the string form of each entity id.
    #[sea_orm(column_type = "Text", nullable)]
    pub entities: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

/// Required enum for Sea-ORM entity relations.
///
/// Sessions do not relate to any other table.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
