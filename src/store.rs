use std::path::{Path, PathBuf};
use std::time::Duration;

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sea_orm::sqlx::ConnectOptions as _;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, RuntimeErr, Set, SqlxSqliteConnector,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::entity::session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity};
use crate::error::{Error, Result};
use crate::schema;

/// A stored session row as read back from the store file.
pub type SessionRow = session::Model;

/// Connection settings applied when a store file is opened.
///
/// The defaults suit the single-writer use the controller makes of a store:
/// one pooled connection, a ten second connect timeout and sqlx statement
/// logging turned off.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    max_connections: u32,
    connect_timeout: Duration,
    sqlx_logging: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 1,
            connect_timeout: Duration::from_secs(10),
            sqlx_logging: false,
        }
    }
}

impl StoreOptions {
    /// Sets the size of the connection pool behind one store handle.
    ///
    /// # Parameters
    ///
    /// * `max_connections` - Upper bound on open SQLite connections. The
    ///   controller never needs more than one.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets how long opening the store may wait for a connection.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use client_session_seaorm_store::StoreOptions;
    ///
    /// let options = StoreOptions::default().with_connect_timeout(Duration::from_secs(2));
    /// ```
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Enables sqlx's per-statement logging through `tracing`.
    pub fn with_sqlx_logging(mut self, enabled: bool) -> Self {
        self.sqlx_logging = enabled;
        self
    }
}

/// The persisted fields of a session, as handed to [`SqliteStore::save_row`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFields {
    pub auth_key: Option<Vec<u8>>,
    pub dc_id: Option<i32>,
    pub server_address: Option<String>,
    pub port: Option<i32>,
    pub entities: Option<String>,
}

/// Name and timestamps of one stored session, as listed by [`SqliteStore::list_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<SessionRow> for SessionSummary {
    fn from(row: SessionRow) -> Self {
        Self {
            name: row.name,
            created_at: convert_datetime_to_time(row.created_at),
            updated_at: convert_datetime_to_time(row.updated_at),
        }
    }
}

/// A SQLite store file holding the `sessions` table, accessed through Sea-ORM.
///
/// `SqliteStore` owns exactly one open handle to one file. Every named session
/// in that file shares the same table, one row per name.
///
/// # Usage
///
/// ```no_run
/// use client_session_seaorm_store::{SessionFields, SqliteStore};
///
/// # async fn example() -> client_session_seaorm_store::Result<()> {
/// let store = SqliteStore::open("data/sessions.db").await?;
///
/// store
///     .save_row(
///         "main",
///         SessionFields {
///             dc_id: Some(2),
///             server_address: Some("149.154.167.40".into()),
///             port: Some(443),
///             ..Default::default()
///         },
///     )
///     .await?;
///
/// let row = store.load_row("main").await?;
/// assert_eq!(row.and_then(|row| row.dc_id), Some(2));
///
/// store.close().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// Every Sea-ORM failure surfaces as [`Error::Store`]; nothing is retried or
/// suppressed at this layer.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// The Sea-ORM database connection used for database operations.
    conn: DatabaseConnection,
    /// The store file this connection was opened against.
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file at `path` with default options.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default()).await
    }

    /// Opens the store file at `path` and makes sure the session table exists.
    ///
    /// Missing parent directories and a missing file are created.
    pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io("creating store directory", parent, e))?;
        }

        let conn = Self::connect(path, &options).await?;
        debug!(path = %path.display(), "opened session store");

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Connects to the SQLite file at `path` without touching the schema,
    /// creating the file if it is missing.
    ///
    /// The path is handed to sqlx as a filename, never spliced into a
    /// connection URL, so `?`, `%` and `#` in it are taken literally. Useful
    /// for running the migrator against the same file a store will open.
    ///
    /// # Returns
    ///
    /// * `Ok(DatabaseConnection)` - A Sea-ORM connection over a sqlx SQLite pool.
    /// * `Err(Error::Store)` - The file could not be opened or created.
    pub async fn connect(path: &Path, options: &StoreOptions) -> Result<DatabaseConnection> {
        let mut connect_options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        if !options.sqlx_logging {
            connect_options = connect_options.disable_statement_logging();
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbErr::Conn(RuntimeErr::SqlxError(e)))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// The store file this handle was opened against.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the `sessions` table if it is absent. Safe to call repeatedly.
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .execute(backend.build(&schema::create_sessions_table()))
            .await?;
        Ok(())
    }

    /// Fetches the row stored under `name`.
    pub async fn load_row(&self, name: &str) -> Result<Option<SessionRow>> {
        let row = SessionEntity::find()
            .filter(session::Column::Name.eq(name))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    /// Inserts or replaces the row stored under `name`.
    ///
    /// This is a single `INSERT ... ON CONFLICT(name) DO UPDATE` statement, so
    /// two handles saving the same file wait on SQLite's busy timeout and the
    /// last writer wins. An update replaces every persisted field and
    /// refreshes `updated_at`; `created_at` keeps the value it got on insert.
    ///
    /// # Parameters
    ///
    /// * `name` - The session name, unique within the file.
    /// * `fields` - The full set of persisted fields; absent values are written as `NULL`.
    pub async fn save_row(&self, name: &str, fields: SessionFields) -> Result<()> {
        let now = convert_time_to_datetime(OffsetDateTime::now_utc());

        let session_model = SessionActiveModel {
            name: Set(name.to_owned()),
            auth_key: Set(fields.auth_key),
            dc_id: Set(fields.dc_id),
            server_address: Set(fields.server_address),
            port: Set(fields.port),
            entities: Set(fields.entities),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        SessionEntity::insert(session_model)
            .on_conflict(
                OnConflict::column(session::Column::Name)
                    .update_columns([
                        session::Column::AuthKey,
                        session::Column::DcId,
                        session::Column::ServerAddress,
                        session::Column::Port,
                        session::Column::Entities,
                        session::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Removes the row stored under `name`; absent names are not an error.
    pub async fn delete_row(&self, name: &str) -> Result<()> {
        SessionEntity::delete_many()
            .filter(session::Column::Name.eq(name))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Lists every session in the file, newest first.
    pub async fn list_rows(&self) -> Result<Vec<SessionSummary>> {
        let rows = SessionEntity::find()
            .order_by_desc(session::Column::CreatedAt)
            .order_by_desc(session::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(SessionSummary::from).collect())
    }

    /// Releases the underlying connection.
    pub async fn close(self) -> Result<()> {
        debug!(path = %self.path.display(), "closing session store");
        self.conn.close().await?;
        Ok(())
    }
}

// Helper function to convert time::OffsetDateTime to sea_orm::prelude::DateTimeWithTimeZone (chrono)
fn convert_time_to_datetime(time: OffsetDateTime) -> DateTimeWithTimeZone {
    chrono::DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond())
        .unwrap_or_default()
        .fixed_offset()
}

fn convert_datetime_to_time(datetime: DateTimeWithTimeZone) -> OffsetDateTime {
    let nanos = i128::from(datetime.timestamp()) * 1_000_000_000
        + i128::from(datetime.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_conversion_round_trips() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(convert_datetime_to_time(convert_time_to_datetime(now)), now);
    }
}
