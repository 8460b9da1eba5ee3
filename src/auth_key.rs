//! The narrow seam to the external credential object.
//!
//! The cryptographic session key lives outside this crate. Persistence only
//! needs to turn it into bytes and back, so that is all [`AuthKey`] asks for.

use thiserror::Error;

/// Bytes-in / bytes-out access to a credential object.
pub trait AuthKey: Clone + Send + Sync + Sized + 'static {
    /// Why a byte string was not accepted as a credential.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Rebuilds a live credential from previously exported bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;

    /// Exports the raw key material.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Plain byte-vector credential for hosts that keep the key as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAuthKey(Vec<u8>);

/// Returned when [`RawAuthKey`] is rebuilt from zero-length input.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("auth key material is empty")]
pub struct EmptyAuthKey;

impl RawAuthKey {
    /// Wraps raw key material as is.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The wrapped key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AuthKey for RawAuthKey {
    type Error = EmptyAuthKey;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            return Err(EmptyAuthKey);
        }
        Ok(Self(bytes.to_vec()))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_rejects_empty_material() {
        assert_eq!(RawAuthKey::from_bytes(&[]), Err(EmptyAuthKey));
    }

    #[test]
    fn raw_key_exports_what_it_was_built_from() {
        let key = RawAuthKey::from_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(key.to_bytes(), vec![1, 2, 3]);
        assert_eq!(key.as_bytes(), &[1, 2, 3]);
    }
}
