//! Encoding of values handed to [`crate::KvWatchClient::put`].
//!
//! Byte and string types are stored verbatim. Structured values go through
//! [`Json`], which falls back to the value's `Debug` rendering when
//! serde_json rejects it (e.g. maps with non-string keys).

use std::fmt::Debug;

use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

/// Capability of turning a value into a stored payload
pub trait Serializable {
    fn encode(&self) -> Bytes;
}

impl Serializable for str {
    fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl Serializable for String {
    fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl Serializable for [u8] {
    fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl Serializable for Vec<u8> {
    fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl Serializable for Bytes {
    fn encode(&self) -> Bytes {
        self.clone()
    }
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn encode(&self) -> Bytes {
        (**self).encode()
    }
}

/// Structured value stored as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize + Debug> Serializable for Json<T> {
    fn encode(&self) -> Bytes {
        match serde_json::to_vec(&self.0) {
            Ok(encoded) => Bytes::from(encoded),
            Err(e) => {
                warn!(error = %e, "json encoding failed, storing debug rendering");
                Bytes::from(format!("{:?}", self.0))
            }
        }
    }
}
