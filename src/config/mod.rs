//! Configuration management for the watch client.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`KVWATCH__` prefix)
//! - Component-wise validation
mod backend;
mod log;
mod watch;
pub use backend::*;
pub use log::*;
pub use watch::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Main configuration container
///
/// Sources are merged with the following priority (later overrides earlier):
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KvWatchConfig {
    /// Store connection and root prefix
    #[serde(default)]
    pub backend: BackendConfig,
    /// Reconnect loop tuning
    #[serde(default)]
    pub watch: WatchConfig,
    /// Log output
    #[serde(default)]
    pub log: LogConfig,
}

impl KvWatchConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so that callers can apply further overrides via
    /// [`with_override_config`](Self::with_override_config). Call
    /// [`validate`](Self::validate) before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("KVWATCH__BACKEND__ROOT_PREFIX", "kvTest");
    /// let cfg = KvWatchConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies overrides from another file, then the environment again.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every subsystem and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.backend.validate()?;
        self.watch.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
