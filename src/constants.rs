/// Separator between path segments of a key
pub(crate) const PATH_SEPARATOR: &str = "/";

/// Environment variable naming an extra configuration file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Prefix of configuration override environment variables, e.g.
/// `KVWATCH__BACKEND__ROOT_PREFIX`
pub(crate) const ENV_PREFIX: &str = "KVWATCH";

/// Log file name inside `log.log_dir`
pub const LOG_FILE_NAME: &str = "kv-watch.log";
