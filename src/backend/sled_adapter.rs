use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sled::IVec;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::KvBackend;
use super::QueryOptions;
use super::QueryResult;
use crate::BackendError;
use crate::KvPair;
use crate::Result;

/// Sled tree holding user keys
pub(crate) const KV_TREE: &str = "_kv_watch_tree";

/// Store backed by an embedded sled database
///
/// Blocking queries park on `Tree::watch_prefix`. The store index lives in
/// memory. Each write and its index bump happen under the index lock, so a
/// query that subscribed first either reads the bumped index or is woken by
/// the subscriber.
#[derive(Debug)]
pub struct SledBackend {
    pub(super) tree: sled::Tree,
    pub(super) index: Mutex<u64>,
}

impl SledBackend {
    pub fn new(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(KV_TREE).map_err(BackendError::from)?;
        Ok(Self {
            tree,
            index: Mutex::new(1),
        })
    }

    /// Opens (or creates) a database directory
    pub fn open_db(path: impl AsRef<Path> + std::fmt::Debug) -> Result<sled::Db> {
        debug!("open sled db from path: {:?}", &path);

        sled::Config::default()
            .path(path.as_ref())
            .cache_capacity(10 * 1024 * 1024) //10MB
            .flush_every_ms(Some(3))
            .use_compression(true)
            .compression_factor(1)
            .open()
            .map_err(|e| {
                warn!("Try to open DB at this location: {:?} and failed: {:?}", path, e);
                BackendError::from(e).into()
            })
    }

    pub fn index(&self) -> u64 {
        *self.index.lock()
    }

    /// Runs `write` and bumps the index if it changed the tree
    fn commit<F>(
        &self,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce(&sled::Tree) -> sled::Result<bool>,
    {
        let mut index = self.index.lock();
        if write(&self.tree).map_err(BackendError::from)? {
            *index += 1;
        }
        Ok(())
    }

    fn scan(
        &self,
        prefix: &str,
    ) -> Result<Vec<KvPair>> {
        self.tree
            .scan_prefix(prefix.as_bytes())
            .map(|item| {
                let (key, value) = item.map_err(BackendError::from)?;
                Ok(KvPair::new(decode_key(&key)?, Bytes::copy_from_slice(&value)))
            })
            .collect()
    }
}

fn decode_key(key: &IVec) -> Result<String> {
    String::from_utf8(key.to_vec())
        .map_err(|e| BackendError::MalformedResponse(format!("non utf-8 key: {e}")).into())
}

#[async_trait]
impl KvBackend for SledBackend {
    async fn list(
        &self,
        prefix: &str,
    ) -> Result<Vec<KvPair>> {
        let mut pairs = self.scan(prefix)?;
        pairs.retain(|p| !p.value.is_empty());
        Ok(pairs)
    }

    async fn put(
        &self,
        key: &str,
        value: Bytes,
    ) -> Result<()> {
        self.commit(|tree| tree.insert(key.as_bytes(), value.as_ref()).map(|_| true))
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<()> {
        self.commit(|tree| tree.remove(key.as_bytes()).map(|old| old.is_some()))
    }

    async fn blocking_list(
        &self,
        prefix: &str,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        // Subscribe before taking the index lock: a write not yet counted in
        // the index is still pending and will fire the subscriber.
        let subscriber = self.tree.watch_prefix(prefix.as_bytes());
        let index = self.index();

        if options.wait_index != 0 && index <= options.wait_index {
            trace!(prefix, wait_index = options.wait_index, "blocking query parked");
            if tokio::time::timeout(options.wait_time, subscriber).await.is_err() {
                trace!(prefix, "blocking query timed out");
            }
        }

        let index = self.index();
        Ok(QueryResult {
            index,
            pairs: self.scan(prefix)?,
        })
    }
}
