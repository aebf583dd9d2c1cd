use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::PATH_SEPARATOR;
use crate::Error;
use crate::Result;

/// Which store implementation the client connects to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, shared by every client built from the same connector
    #[default]
    Memory,
    /// Embedded sled database; `address` is the database directory
    Sled,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Store location. Required for [`BackendKind::Sled`].
    #[serde(default)]
    pub address: String,

    /// Every path is resolved under this prefix. Empty means the store root.
    #[serde(default)]
    pub root_prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            address: String::new(),
            root_prefix: String::new(),
        }
    }
}

impl BackendConfig {
    pub fn with_root_prefix(
        mut self,
        prefix: impl Into<String>,
    ) -> Self {
        self.root_prefix = prefix.into();
        self
    }

    pub fn with_address(
        mut self,
        address: impl Into<String>,
    ) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_kind(
        mut self,
        kind: BackendKind,
    ) -> Self {
        self.kind = kind;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind == BackendKind::Sled && self.address.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "backend.address must name the database directory for the sled backend".into(),
            )));
        }

        if self.root_prefix.starts_with(PATH_SEPARATOR) || self.root_prefix.ends_with(PATH_SEPARATOR) {
            return Err(Error::Config(ConfigError::Message(format!(
                "backend.root_prefix {:?} must not start or end with '{}'",
                self.root_prefix, PATH_SEPARATOR
            ))));
        }

        Ok(())
    }
}
