use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::auth_key::AuthKey;
use crate::cache::EntityCache;
use crate::error::{Error, Result};
use crate::store::{SessionFields, SessionRow};

/// Port assumed when a stored data center has no port recorded.
pub const DEFAULT_PORT: u16 = 443;

/// The in-memory durable fields of one session plus its entity cache.
#[derive(Debug)]
pub struct SessionRecord<K, E> {
    pub auth_key: Option<K>,
    pub dc_id: Option<i32>,
    pub server_address: String,
    pub port: u16,
    pub entities: EntityCache<E>,
}

impl<K, E> Default for SessionRecord<K, E> {
    fn default() -> Self {
        Self {
            auth_key: None,
            dc_id: None,
            server_address: String::new(),
            port: DEFAULT_PORT,
            entities: EntityCache::new(),
        }
    }
}

impl<K: AuthKey, E> SessionRecord<K, E> {
    /// Whether a credential is present.
    pub fn has_auth(&self) -> bool {
        self.auth_key.is_some()
    }

    /// Sets all three routing fields at once. Memory only; persisting is the
    /// controller's job.
    pub fn set_data_center(&mut self, dc_id: i32, server_address: String, port: u16) {
        self.dc_id = Some(dc_id);
        self.server_address = server_address;
        self.port = port;
    }
}

impl<K: AuthKey, E: Serialize> SessionRecord<K, E> {
    /// Flattens the record into the columns written by the store.
    pub fn to_fields(&self) -> Result<SessionFields> {
        Ok(SessionFields {
            auth_key: self.auth_key.as_ref().map(AuthKey::to_bytes),
            dc_id: self.dc_id,
            server_address: self.dc_id.map(|_| self.server_address.clone()),
            port: self.dc_id.map(|_| i32::from(self.port)),
            entities: Some(self.entities.to_json()?),
        })
    }
}

impl<K: AuthKey, E: DeserializeOwned> SessionRecord<K, E> {
    /// Rebuilds a record from a stored row.
    ///
    /// An empty key blob counts as no key. Routing is only taken from rows that
    /// carry a `dc_id`. A corrupt `entities` column yields an empty cache.
    pub fn from_row(row: SessionRow) -> Result<Self> {
        let mut record = Self::default();

        if let Some(bytes) = row.auth_key.filter(|bytes| !bytes.is_empty()) {
            record.auth_key = Some(K::from_bytes(&bytes).map_err(Error::decode)?);
        }

        if let Some(dc_id) = row.dc_id {
            record.dc_id = Some(dc_id);
            record.server_address = row.server_address.unwrap_or_default();
            record.port = row
                .port
                .and_then(|port| u16::try_from(port).ok())
                .unwrap_or(DEFAULT_PORT);
        }

        if let Some(blob) = row.entities.as_deref() {
            record.entities = EntityCache::from_json(blob).unwrap_or_else(|e| {
                warn!(session = %row.name, error = %e, "ignoring malformed cached entities");
                EntityCache::new()
            });
        }

        Ok(record)
    }
}
