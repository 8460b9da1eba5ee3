//! File export and import of a session snapshot.
//!
//! The exported document is a flat, pretty-printed JSON object:
//!
//! ```json
//! {
//!   "dc_id": 2,
//!   "server_address": "149.154.167.40",
//!   "port": 443,
//!   "auth_key": "a1b2c3...",
//!   "entities": { "123456789": { "first_name": "Ada" } },
//!   "exported_at": "2024-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! It carries no row id or store timestamps, so it can be moved between store
//! files freely.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::auth_key::AuthKey;
use crate::cache::EntityCache;
use crate::error::{Error, Result};
use crate::record::{SessionRecord, DEFAULT_PORT};

/// Point-in-time snapshot of a session as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub dc_id: Option<i32>,
    #[serde(default)]
    pub server_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Lower-case hex of the raw key bytes.
    #[serde(default)]
    pub auth_key: Option<String>,
    #[serde(default)]
    pub entities: Map<String, Value>,
    #[serde(default)]
    pub exported_at: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl SessionDocument {
    pub fn from_record<K: AuthKey, E: Serialize>(record: &SessionRecord<K, E>) -> Result<Self> {
        let mut entities = Map::with_capacity(record.entities.len());
        for (id, entity) in record.entities.iter() {
            entities.insert(id.to_string(), serde_json::to_value(&**entity)?);
        }

        Ok(Self {
            dc_id: record.dc_id,
            server_address: record.server_address.clone(),
            port: record.port,
            auth_key: record
                .auth_key
                .as_ref()
                .map(|key| hex::encode(key.to_bytes())),
            entities,
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Decodes the hex key into a live credential, `None` when the document has no key.
    pub fn decode_auth_key<K: AuthKey>(&self) -> Result<Option<K>> {
        let Some(encoded) = self.auth_key.as_deref() else {
            return Ok(None);
        };
        let bytes = hex::decode(encoded).map_err(Error::decode)?;
        K::from_bytes(&bytes).map(Some).map_err(Error::decode)
    }

    /// Converts the `entities` mapping into a cache. Non-integer keys are skipped.
    pub fn entity_cache<E: DeserializeOwned>(&self) -> Result<EntityCache<E>> {
        let entries = self
            .entities
            .iter()
            .map(|(key, value)| E::deserialize(value).map(|entity| (key.clone(), entity)))
            .collect::<serde_json::Result<Vec<(String, E)>>>()?;
        Ok(EntityCache::from_entries(entries))
    }
}

/// Writes `record` to `path` as a pretty-printed document, creating parent
/// directories as needed. Returns the path written.
pub async fn export_to_file<K: AuthKey, E: Serialize>(
    path: impl AsRef<Path>,
    record: &SessionRecord<K, E>,
) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io("creating export directory", parent, e))?;
    }

    let document = SessionDocument::from_record(record)?;
    let contents = serde_json::to_string_pretty(&document)?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::io("writing session export", path, e))?;

    info!(path = %path.display(), entities = record.entities.len(), "exported session");
    Ok(path.to_path_buf())
}

/// Reads and validates a document written by [`export_to_file`].
///
/// Only the presence of a numeric `dc_id` is checked; other fields are taken
/// as they are.
pub async fn import_from_file(path: impl AsRef<Path>) -> Result<SessionDocument> {
    let path = path.as_ref();
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(Error::io("reading session export", path, e)),
    };

    parse_document(&contents)
}

fn parse_document(contents: &str) -> Result<SessionDocument> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| Error::Format(format!("not a JSON document: {e}")))?;

    if !value.get("dc_id").is_some_and(Value::is_number) {
        return Err(Error::Format("missing numeric dc_id".to_string()));
    }

    serde_json::from_value(value).map_err(|e| Error::Format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::auth_key::RawAuthKey;

    fn sample_record() -> SessionRecord<RawAuthKey, Value> {
        let mut record = SessionRecord::default();
        record.set_data_center(4, "149.154.167.91".to_string(), 443);
        record.auth_key = Some(RawAuthKey::new(vec![0xab; 16]));
        record.entities.set(1, Arc::new(json!({ "name": "x" })));
        record
    }

    #[test]
    fn document_hex_encodes_the_key() {
        let document = SessionDocument::from_record(&sample_record()).unwrap();

        assert_eq!(document.dc_id, Some(4));
        assert_eq!(document.auth_key.as_deref(), Some("ab".repeat(16).as_str()));
        assert_eq!(document.entities["1"], json!({ "name": "x" }));
        assert!(document.exported_at.ends_with('Z'));
    }

    #[test]
    fn document_without_key_serializes_null() {
        let record = SessionRecord::<RawAuthKey, Value>::default();
        let value = serde_json::to_value(SessionDocument::from_record(&record).unwrap()).unwrap();

        assert_eq!(value["auth_key"], Value::Null);
    }

    #[test]
    fn parse_rejects_missing_dc_id() {
        let error = parse_document(r#"{"server_address": "1.2.3.4", "port": 443}"#).unwrap_err();
        assert!(matches!(error, Error::Format(_)));
    }

    #[test]
    fn parse_rejects_string_dc_id() {
        let error = parse_document(r#"{"dc_id": "2"}"#).unwrap_err();
        assert!(matches!(error, Error::Format(_)));
    }

    #[test]
    fn parse_fills_defaults_for_trusted_fields() {
        let document = parse_document(r#"{"dc_id": 2}"#).unwrap();

        assert_eq!(document.port, DEFAULT_PORT);
        assert!(document.server_address.is_empty());
        assert!(document.auth_key.is_none());
        assert!(document.entities.is_empty());
    }

    #[test]
    fn bad_hex_is_a_decode_error() {
        let document = parse_document(r#"{"dc_id": 2, "auth_key": "zz"}"#).unwrap();
        let error = document.decode_auth_key::<RawAuthKey>().unwrap_err();
        assert!(matches!(error, Error::Decode(_)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let error = import_from_file(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn export_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("session.json");

        let written = export_to_file(&target, &sample_record()).await.unwrap();
        assert_eq!(written, target);

        let document = import_from_file(&target).await.unwrap();
        let key = document.decode_auth_key::<RawAuthKey>().unwrap().unwrap();
        assert_eq!(key.as_bytes(), &[0xab; 16]);
        assert_eq!(document.entity_cache::<Value>().unwrap().len(), 1);
    }
}
