//! Point reads with JSON descent into stored documents

use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::constants::PATH_SEPARATOR;
use crate::utils::path::abs_path;
use crate::utils::path::rel_key;
use crate::Error;
use crate::KvBackend;
use crate::KvPair;
use crate::ValueCell;

pub(super) async fn get(
    backend: &dyn KvBackend,
    root: &str,
    segments: &[&str],
) -> ValueCell {
    let path = abs_path(root, segments);
    let key = rel_key(root, &path);

    // Every candidate key starts with the first segment
    let scope = abs_path(root, &segments[..segments.len().min(1)]);
    let pairs = match backend.list(&scope).await {
        Ok(pairs) => pairs,
        Err(e) => {
            debug!(%path, error = %e, "get failed");
            return ValueCell::failed(key, e);
        }
    };

    match resolve(&pairs, &path) {
        Some(value) => ValueCell::new(key, value),
        None => ValueCell::failed(key.clone(), Error::KeyNotFound { key }),
    }
}

/// Value at `path`: an exact key, or the longest key that is a path prefix
/// of `path` with the rest resolved as a JSON pointer into its value.
pub(super) fn resolve(
    pairs: &[KvPair],
    path: &str,
) -> Option<Bytes> {
    let (pair, residual) = pairs
        .iter()
        .filter_map(|pair| residual(&pair.key, path).map(|rest| (pair, rest)))
        .max_by_key(|(pair, _)| pair.key.len())?;

    if residual.is_empty() {
        return Some(pair.value.clone());
    }

    let document: Value = serde_json::from_slice(&pair.value).ok()?;
    match document.pointer(&json_pointer(residual))? {
        Value::String(s) => Some(Bytes::from(s.clone())),
        other => serde_json::to_vec(other).ok().map(Bytes::from),
    }
}

fn residual<'a>(
    key: &str,
    path: &'a str,
) -> Option<&'a str> {
    let rest = path.strip_prefix(key)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(PATH_SEPARATOR)
}

fn json_pointer(residual: &str) -> String {
    residual.split(PATH_SEPARATOR).fold(String::new(), |mut pointer, token| {
        pointer.push('/');
        pointer.push_str(&token.replace('~', "~0"));
        pointer
    })
}
