//! Watch client error hierarchy
//!
//! Synchronous operations (`put`, `delete`, `watch` registration) surface
//! these directly. Failures inside a reconnect loop are only logged; they
//! never reach a change handler.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A watch is already registered for this absolute path
    #[error("Path {path} is already being watched")]
    AlreadyWatching { path: String },

    /// Read miss, carried inside a [`crate::ValueCell`]
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    /// Transient store failures (connectivity, malformed responses)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Invalid configuration or watch path
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Store cannot be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Store answered with data we cannot interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    Sled(#[from] sled::Error),
}

impl Error {
    /// Whether a reconnect loop should keep retrying after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}
