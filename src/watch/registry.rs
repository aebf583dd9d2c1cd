use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::WatchEntry;
use crate::Error;
use crate::Result;

/// Absolute path -> live watch
///
/// One mutex guards every structural change and every read of the map's
/// shape. Entry snapshots carry their own lock, so a busy loop on one path
/// never blocks registry operations on another.
///
/// Dropping the registry requests a stop on every entry it still holds.
#[derive(Default)]
pub struct WatchRegistry {
    entries: Mutex<HashMap<String, Arc<WatchEntry>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` under its path. Fails without side effects if the
    /// path is taken.
    pub fn register(
        &self,
        entry: Arc<WatchEntry>,
    ) -> Result<()> {
        let mut entries = self.entries.lock();
        match entries.entry(entry.path().to_string()) {
            Entry::Occupied(occupied) => Err(Error::AlreadyWatching {
                path: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                debug!(path = %vacant.key(), "watch registered");
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    pub fn lookup(
        &self,
        path: &str,
    ) -> Option<Arc<WatchEntry>> {
        self.entries.lock().get(path).cloned()
    }

    /// Idempotent; returns the removed entry so the caller can stop it.
    pub fn unregister(
        &self,
        path: &str,
    ) -> Option<Arc<WatchEntry>> {
        let removed = self.entries.lock().remove(path);
        if removed.is_some() {
            debug!(path, "watch unregistered");
        }
        removed
    }

    /// Atomically empties the registry
    pub fn drain_all(&self) -> Vec<Arc<WatchEntry>> {
        self.entries.lock().drain().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Watched absolute paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values() {
            entry.request_stop();
        }
    }
}
