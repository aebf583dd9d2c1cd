use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Reconnect loop tuning
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Fixed backoff after a failed blocking query
    ///
    /// **Default**: 3000
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Longest time a single blocking query may wait for a change before
    /// the store answers with unchanged data
    ///
    /// **Default**: 300000 (5 minutes)
    #[serde(default = "default_wait_time_ms")]
    pub wait_time_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            wait_time_ms: default_wait_time_ms(),
        }
    }
}

impl WatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_delay_ms == 0 || self.retry_delay_ms > 600_000 {
            return Err(Error::Config(ConfigError::Message(format!(
                "watch.retry_delay_ms must be within 1..=600000, got {}",
                self.retry_delay_ms
            ))));
        }

        if self.wait_time_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch.wait_time_ms must be at least 1ms".into(),
            )));
        }

        Ok(())
    }
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_wait_time_ms() -> u64 {
    300_000
}
