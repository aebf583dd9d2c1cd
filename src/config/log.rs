use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory for the log file. Empty logs to stdout only.
    #[serde(default)]
    pub log_dir: String,

    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: String::new(),
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
