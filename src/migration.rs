pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_sessions_table;

/// Migrator for applications that manage their schema with `sea-orm-migration`
/// instead of relying on [`SqliteStore::ensure_schema`](crate::SqliteStore::ensure_schema).
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Override the name of migration table to avoid conflicts
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("client_session_store_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_sessions_table::Migration)]
    }
}
