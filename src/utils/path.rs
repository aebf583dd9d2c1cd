//! Key path resolution against a configured root prefix.
//!
//! Reads, writes, deletes and watch registration all go through
//! [`abs_path`] so that every operation addresses the same key space.

use config::ConfigError;

use crate::constants::PATH_SEPARATOR;
use crate::Error;
use crate::Result;

/// Joins `segments` under `root`.
///
/// - no segments, or an empty first segment, yields `root` itself
/// - an empty `root` yields the joined segments without a leading separator
pub fn abs_path<S: AsRef<str>>(
    root: &str,
    segments: &[S],
) -> String {
    let Some(first) = segments.first() else {
        return root.to_string();
    };
    if first.as_ref().is_empty() {
        return root.to_string();
    }

    let joined = segments.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(PATH_SEPARATOR);
    if root.is_empty() {
        return joined;
    }

    format!("{root}{PATH_SEPARATOR}{joined}")
}

/// Strips `root/` and any trailing separator from an absolute key.
pub fn rel_key(
    root: &str,
    key: &str,
) -> String {
    let relative = if root.is_empty() {
        key
    } else {
        key.strip_prefix(root)
            .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
            .unwrap_or(key)
    };

    relative.strip_suffix(PATH_SEPARATOR).unwrap_or(relative).to_string()
}

/// Rejects watch paths the store cannot address unambiguously.
pub(crate) fn validate_watch_path(path: &str) -> Result<()> {
    if path.starts_with(PATH_SEPARATOR) {
        return Err(invalid(path, "must be relative to the root prefix"));
    }
    if path.contains("//") {
        return Err(invalid(path, "contains an empty segment"));
    }
    if path.chars().any(char::is_control) {
        return Err(invalid(path, "contains control characters"));
    }
    Ok(())
}

fn invalid(
    path: &str,
    reason: &str,
) -> Error {
    Error::Config(ConfigError::Message(format!("invalid watch path {path:?}: {reason}")))
}
