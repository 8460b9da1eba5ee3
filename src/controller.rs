use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth_key::AuthKey;
use crate::codec;
use crate::error::{Error, Result};
use crate::record::SessionRecord;
use crate::registry;
use crate::storage::EntityStorage;
use crate::store::{SqliteStore, StoreOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    Loaded,
}

/// A change made through a controller mutator.
///
/// While the controller is unloaded every mutation is kept so that `load()`
/// can replay it over the stored row instead of losing it.
#[derive(Debug)]
enum Mutation<K, E> {
    DataCenter {
        dc_id: i32,
        server_address: String,
        port: u16,
    },
    AuthKey(Option<K>),
    SetEntity(i64, Arc<E>),
    DeleteEntity(i64),
}

impl<K: AuthKey, E> Mutation<K, E> {
    fn apply(&self, record: &mut SessionRecord<K, E>) {
        match self {
            Self::DataCenter {
                dc_id,
                server_address,
                port,
            } => record.set_data_center(*dc_id, server_address.clone(), *port),
            Self::AuthKey(key) => record.auth_key = key.clone(),
            Self::SetEntity(id, entity) => {
                record.entities.set(*id, Arc::clone(entity));
            }
            Self::DeleteEntity(id) => {
                record.entities.delete(*id);
            }
        }
    }
}

/// Snapshot of a controller's state, taken without I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    pub name: String,
    pub dc_id: Option<i32>,
    pub has_auth: bool,
    pub entities_count: usize,
}

/// Durable session for one name in one store file.
///
/// A controller starts unloaded and does no I/O until asked to. [`load`](Self::load)
/// pulls the stored row exactly once; from then on every mutator writes the
/// whole session straight back to the store.
///
/// Mutations made before the first `load()` are applied in memory and
/// replayed over the stored row when it is loaded, then persisted.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use client_session_seaorm_store::{RawAuthKey, SessionController};
/// use serde_json::json;
///
/// # async fn example() -> client_session_seaorm_store::Result<()> {
/// let mut session = SessionController::<RawAuthKey>::new("data/sessions.db", "main");
/// session.load().await?;
///
/// if session.auth_key().is_none() {
///     session.set_data_center(2, "149.154.167.40", 443).await?;
///     session.set_auth_key(Some(RawAuthKey::new(vec![7; 256]))).await?;
/// }
/// session.set_entity(777000, Arc::new(json!({ "first_name": "Service" }))).await?;
///
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionController<K, E = Value> {
    path: PathBuf,
    name: String,
    options: StoreOptions,
    store: Option<SqliteStore>,
    state: LoadState,
    record: SessionRecord<K, E>,
    pending: Vec<Mutation<K, E>>,
}

impl<K, E> SessionController<K, E>
where
    K: AuthKey,
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates an unloaded controller for session `name` in the store file at `path`.
    ///
    /// Nothing is opened or read until the first [`load`](Self::load),
    /// [`save`](Self::save) or write-through.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            options: StoreOptions::default(),
            store: None,
            state: LoadState::Unloaded,
            record: SessionRecord::default(),
            pending: Vec::new(),
        }
    }

    /// Connection settings used whenever the store handle is (re)opened.
    pub fn with_store_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// The session name this controller persists under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store file this controller writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `load()` (or an import) has completed.
    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// The in-memory session. Before `load()` this holds defaults plus any
    /// queued mutations, not the stored row.
    pub fn record(&self) -> &SessionRecord<K, E> {
        &self.record
    }

    pub fn auth_key(&self) -> Option<&K> {
        self.record.auth_key.as_ref()
    }

    pub fn dc_id(&self) -> Option<i32> {
        self.record.dc_id
    }

    pub fn server_address(&self) -> &str {
        &self.record.server_address
    }

    /// Data-center port; 443 until a data center is set.
    pub fn port(&self) -> u16 {
        self.record.port
    }

    /// The cached entity under `id`, if any.
    pub fn get_entity(&self, id: i64) -> Option<Arc<E>> {
        self.record.entities.get(id)
    }

    pub fn has_entity(&self, id: i64) -> bool {
        self.record.entities.has(id)
    }

    /// Every cached entity, in no particular order.
    pub fn entities(&self) -> Vec<Arc<E>> {
        self.record.entities.values()
    }

    /// Finds the id under which this exact `Arc` is cached.
    ///
    /// Lookup is by pointer identity: an equal but separately allocated value
    /// is not found.
    pub fn reverse_lookup(&self, entity: &Arc<E>) -> Option<i64> {
        self.record.entities.reverse_lookup(entity)
    }

    /// Snapshot of name, data center, auth presence and cache size.
    ///
    /// # Returns
    ///
    /// A [`ControllerInfo`] built from memory only; no I/O is done.
    pub fn get_info(&self) -> ControllerInfo {
        ControllerInfo {
            name: self.name.clone(),
            dc_id: self.record.dc_id,
            has_auth: self.record.has_auth(),
            entities_count: self.record.entities.len(),
        }
    }

    /// Returns the open store handle, opening it first if needed.
    async fn handle(&mut self) -> Result<&mut SqliteStore> {
        let store = match self.store.take() {
            Some(store) => store,
            None => SqliteStore::open_with(&self.path, self.options.clone()).await?,
        };
        Ok(self.store.insert(store))
    }

    /// Pulls the stored row into memory. Does nothing once loaded.
    ///
    /// Mutations queued while unloaded are replayed over the stored row and the
    /// result is saved. The controller only becomes loaded once that save
    /// succeeds; on any error it stays unloaded and keeps its queue.
    ///
    /// # Errors
    ///
    /// * [`Error::Store`] - The store file could not be opened or queried.
    /// * [`Error::Decode`] - The stored auth key was rejected by `K`.
    /// * [`Error::Json`] - The replayed entities could not be serialized.
    pub async fn load(&mut self) -> Result<()> {
        if self.state == LoadState::Loaded {
            return Ok(());
        }

        let name = self.name.clone();
        let row = self.handle().await?.load_row(&name).await?;
        let found = row.is_some();
        let mut record = match row {
            Some(row) => SessionRecord::from_row(row)?,
            None => SessionRecord::default(),
        };

        let pending = std::mem::take(&mut self.pending);
        for mutation in &pending {
            mutation.apply(&mut record);
        }
        self.record = record;

        // Stay unloaded with the queue intact until the replayed state is stored,
        // so a retry of `load()` replays it again.
        if !pending.is_empty() {
            if let Err(e) = self.save().await {
                self.pending = pending;
                return Err(e);
            }
        }

        self.state = LoadState::Loaded;
        debug!(
            session = %self.name,
            found,
            replayed = pending.len(),
            "loaded session"
        );
        Ok(())
    }

    /// Writes the full in-memory session to the store and returns its name.
    ///
    /// Allowed in either state; an unloaded controller overwrites the stored
    /// row with whatever it holds in memory.
    pub async fn save(&mut self) -> Result<String> {
        let fields = self.record.to_fields()?;
        let name = self.name.clone();
        self.handle().await?.save_row(&name, fields).await?;
        self.pending.clear();

        debug!(session = %name, entities = self.record.entities.len(), "saved session");
        Ok(name)
    }

    async fn mutate(&mut self, mutation: Mutation<K, E>) -> Result<()> {
        mutation.apply(&mut self.record);
        match self.state {
            LoadState::Loaded => self.save().await.map(drop),
            LoadState::Unloaded => {
                self.pending.push(mutation);
                Ok(())
            }
        }
    }

    /// Points the session at a data center.
    ///
    /// # Parameters
    ///
    /// * `dc_id` - Data-center identifier.
    /// * `server_address` - Host or IP of the data center.
    /// * `port` - Port of the data center.
    pub async fn set_data_center(
        &mut self,
        dc_id: i32,
        server_address: impl Into<String>,
        port: u16,
    ) -> Result<()> {
        self.mutate(Mutation::DataCenter {
            dc_id,
            server_address: server_address.into(),
            port,
        })
        .await
    }

    /// Replaces the credential; `None` clears it.
    pub async fn set_auth_key(&mut self, auth_key: Option<K>) -> Result<()> {
        self.mutate(Mutation::AuthKey(auth_key)).await
    }

    /// Caches `entity` under `id`, replacing any previous entry.
    pub async fn set_entity(&mut self, id: i64, entity: Arc<E>) -> Result<()> {
        self.mutate(Mutation::SetEntity(id, entity)).await
    }

    /// Removes a cached entity; `true` if it was present.
    pub async fn delete_entity(&mut self, id: i64) -> Result<bool> {
        let existed = self.record.entities.has(id);
        self.mutate(Mutation::DeleteEntity(id)).await?;
        Ok(existed)
    }

    /// Releases the store handle. Later I/O opens a fresh one.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(store) = self.store.take() {
            store.close().await?;
            debug!(session = %self.name, "closed session handle");
        }
        Ok(())
    }

    /// Deletes the stored row and resets the controller to a fresh, unloaded state.
    pub async fn delete(&mut self) -> Result<()> {
        self.close().await?;
        registry::delete_session(&self.path, &self.name).await?;

        self.record = SessionRecord::default();
        self.pending.clear();
        self.state = LoadState::Unloaded;
        Ok(())
    }

    /// Writes this session to a JSON document at `path`. See
    /// [`codec::export_to_file`](crate::codec::export_to_file).
    pub async fn export_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        codec::export_to_file(path, &self.record).await
    }

    /// Replaces this session with the contents of an exported document and persists it.
    ///
    /// The document is fully validated and decoded before any state changes.
    pub async fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let document = codec::import_from_file(path.as_ref()).await?;
        let auth_key = document.decode_auth_key::<K>()?;
        let entities = document.entity_cache::<E>()?;
        let dc_id = document
            .dc_id
            .ok_or_else(|| Error::Format("missing numeric dc_id".to_string()))?;

        self.record.auth_key = auth_key;
        self.record
            .set_data_center(dc_id, document.server_address, document.port);
        self.record.entities = entities;
        self.pending.clear();

        self.save().await?;
        self.state = LoadState::Loaded;

        info!(
            session = %self.name,
            path = %path.as_ref().display(),
            entities = self.record.entities.len(),
            "imported session"
        );
        Ok(())
    }
}

#[async_trait]
impl<K, E> EntityStorage<E> for SessionController<K, E>
where
    K: AuthKey,
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn get_entity(&self, id: i64) -> Option<Arc<E>> {
        Self::get_entity(self, id)
    }

    async fn set_entity(&mut self, id: i64, entity: Arc<E>) -> Result<()> {
        Self::set_entity(self, id, entity).await
    }

    async fn delete_entity(&mut self, id: i64) -> Result<bool> {
        Self::delete_entity(self, id).await
    }

    fn entities(&self) -> Vec<Arc<E>> {
        Self::entities(self)
    }
}
