use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::Error;

/// A raw key/value pair as stored by a backend. `key` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Bytes,
}

impl KvPair {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result of a read or a change notification
///
/// `key` is relative to the client's root prefix. An empty `value` means
/// the key is absent or was deleted. A cell never carries both a
/// meaningful value and an error.
#[derive(Debug, Clone, Default)]
pub struct ValueCell {
    key: String,
    value: Bytes,
    error: Option<Arc<Error>>,
}

impl ValueCell {
    pub(crate) fn new(
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            error: None,
        }
    }

    pub(crate) fn failed(
        key: impl Into<String>,
        error: Error,
    ) -> Self {
        Self {
            key: key.into(),
            value: Bytes::new(),
            error: Some(Arc::new(error)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn err(&self) -> Option<&Error> {
        self.error.as_deref()
    }

    /// True for deletion notifications
    pub fn is_deleted(&self) -> bool {
        self.error.is_none() && self.value.is_empty()
    }

    /// Payload as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    /// Decodes a payload written with [`crate::Json`]
    pub fn decode_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.value)
    }
}
