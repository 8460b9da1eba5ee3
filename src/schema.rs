//! Table definition shared by [`SqliteStore::ensure_schema`](crate::SqliteStore::ensure_schema)
//! and the optional migrator.

use sea_orm::sea_query::{ColumnDef, Expr, Table, TableCreateStatement};

use crate::entity::session::{Column, Entity};

/// Builds the idempotent `CREATE TABLE IF NOT EXISTS sessions (...)` statement.
pub fn create_sessions_table() -> TableCreateStatement {
    Table::create()
        .table(Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Column::Name).text().not_null().unique_key())
        .col(ColumnDef::new(Column::AuthKey).blob().null())
        .col(ColumnDef::new(Column::DcId).integer().null())
        .col(ColumnDef::new(Column::ServerAddress).text().null())
        .col(ColumnDef::new(Column::Port).integer().null())
        .col(ColumnDef::new(Column::Entities).text().null())
        .col(
            ColumnDef::new(Column::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Column::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}
