//! Watch client
//!
//! [`KvWatchClient`] is the handle applications hold. It resolves every path
//! under the configured root prefix, forwards reads and writes to the
//! backend and owns the [`WatchRegistry`] with one reconnect loop per
//! watched path.
//!
//! # Basic Usage
//! ```no_run
//! use kv_watch::{KvWatchClient, KvWatchConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut config = KvWatchConfig::default();
//!     config.backend.root_prefix = "kvTest".into();
//!
//!     let client = KvWatchClient::builder(config).build().await.unwrap();
//!
//!     client
//!         .watch("test", |cell| println!("{} changed: {:?}", cell.key(), cell.as_str()))
//!         .await
//!         .unwrap();
//!     client.put("test", "value").await.unwrap();
//!
//!     let cell = client.get(&["test"]).await;
//!     println!("test = {:?}", cell.as_str());
//!
//!     client.stop_watch(&["test"]).await;
//! }
//! ```

mod builder;
mod lookup;

pub use builder::*;


use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;

use crate::utils::path::abs_path;
use crate::utils::path::rel_key;
use crate::utils::path::validate_watch_path;
use crate::watch::ReconnectLoop;
use crate::BackendConfig;
use crate::Connector;
use crate::KvBackend;
use crate::KvWatchConfig;
use crate::Result;
use crate::Serializable;
use crate::ValueCell;
use crate::WatchConfig;
use crate::WatchEntry;
use crate::WatchHandler;
use crate::WatchRegistry;
use crate::WatchStream;

/// Main entry point for reading, writing and watching keys
///
/// Cheap to clone; clones share the backend connection and the watch
/// registry. Created through the [`builder()`](KvWatchClient::builder)
/// method.
#[derive(Clone)]
pub struct KvWatchClient {
    pub(super) inner: Arc<ArcSwap<ClientInner>>,
    pub(super) registry: Arc<WatchRegistry>,
    pub(super) connector: Arc<dyn Connector>,
    pub(super) watch_config: WatchConfig,
    /// Held shared by `watch`, exclusively by `reset`
    pub(super) lifecycle: Arc<RwLock<()>>,
}

/// Connection state replaced as a whole by [`KvWatchClient::reset`]
pub struct ClientInner {
    pub(super) backend: Arc<dyn KvBackend>,
    pub(super) config: BackendConfig,
}

impl KvWatchClient {
    /// Create a configured client builder
    ///
    /// Chain configuration methods before calling
    /// [`build()`](KvWatchClientBuilder::build).
    pub fn builder(config: KvWatchConfig) -> KvWatchClientBuilder {
        KvWatchClientBuilder::new(config)
    }

    /// Prefix every path is resolved under
    pub fn root_prefix(&self) -> String {
        self.inner.load().config.root_prefix.clone()
    }

    /// Stores `value` at `path`
    ///
    /// # Errors
    /// - [`crate::Error::Backend`] when the store cannot be reached
    pub async fn put<V>(
        &self,
        path: &str,
        value: V,
    ) -> Result<()>
    where
        V: Serializable,
    {
        let inner = self.inner.load_full();
        let key = abs_path(&inner.config.root_prefix, &[path]);
        let payload = value.encode();
        debug!(%key, len = payload.len(), "put");

        inner.backend.put(&key, payload).await
    }

    /// Removes `path`. Deleting an absent key succeeds.
    pub async fn delete(
        &self,
        path: &str,
    ) -> Result<()> {
        let inner = self.inner.load_full();
        let key = abs_path(&inner.config.root_prefix, &[path]);
        debug!(%key, "delete");

        inner.backend.delete(&key).await
    }

    /// Reads the value at `segments` joined under the root prefix
    ///
    /// Never fails: a miss carries [`crate::Error::KeyNotFound`] and a store
    /// failure carries [`crate::Error::Backend`] in the returned cell. When
    /// no key matches exactly, the longest stored key that is a path prefix
    /// of the request is read and the remaining segments are resolved as a
    /// JSON pointer into its value.
    pub async fn get(
        &self,
        segments: &[&str],
    ) -> ValueCell {
        let inner = self.inner.load_full();
        lookup::get(inner.backend.as_ref(), &inner.config.root_prefix, segments).await
    }

    /// Starts watching every key under `path`
    ///
    /// `handler` runs on the watch's loop task once per changed key, with
    /// the key relative to the root prefix. Deletions arrive as cells with
    /// an empty value. Keys match by raw string prefix: a watch on `test`
    /// also reports `test2`.
    ///
    /// A handler must not block on `watch`, `stop_watch` or `reset` of the
    /// same client: `reset` waits for every loop while holding the lifecycle
    /// lock, so a loop parked on it never exits. Spawn such calls instead.
    ///
    /// # Errors
    /// - [`crate::Error::AlreadyWatching`] if `path` is watched already
    /// - [`crate::Error::Config`] if `path` cannot be watched
    pub async fn watch<F>(
        &self,
        path: &str,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(ValueCell) + Send + Sync + 'static,
    {
        self.watch_with(path, Arc::new(handler)).await
    }

    /// Like [`watch`](Self::watch), delivering changes through a stream
    pub async fn watch_stream(
        &self,
        path: &str,
    ) -> Result<WatchStream> {
        let (handler, stream) = WatchStream::channel();
        self.watch_with(path, handler).await?;
        Ok(stream)
    }

    async fn watch_with(
        &self,
        path: &str,
        handler: WatchHandler,
    ) -> Result<()> {
        validate_watch_path(path)?;

        let _lifecycle = self.lifecycle.read().await;
        let inner = self.inner.load_full();
        let root = &inner.config.root_prefix;

        let entry = Arc::new(WatchEntry::new(abs_path(root, &[path]), root.clone(), handler));
        self.registry.register(entry.clone())?;
        info!(path = %entry.path(), "watching path");

        ReconnectLoop::new(entry, inner.backend.clone(), &self.watch_config).spawn();
        Ok(())
    }

    /// Stops the named watches, or every watch when `paths` is empty
    ///
    /// Each path is free for a new [`watch`](Self::watch) as soon as this is
    /// called. Returns once every targeted loop has exited, so no handler of
    /// a stopped watch runs afterwards. Must not be awaited from a handler of
    /// one of the targeted paths.
    pub async fn stop_watch(
        &self,
        paths: &[&str],
    ) {
        if paths.is_empty() {
            return self.stop_all().await;
        }

        let root = self.root_prefix();
        let mut stopping = Vec::with_capacity(paths.len());
        for path in paths {
            let key = abs_path(&root, &[*path]);
            match self.registry.unregister(&key) {
                Some(entry) => {
                    entry.request_stop();
                    stopping.push(entry);
                }
                None => info!(path = %key, "watcher already stopped"),
            }
        }

        wait_stopped(&stopping).await;
    }

    /// Stops every watch and waits for all loops to exit
    pub async fn stop_all(&self) {
        let drained = self.registry.drain_all();
        if drained.is_empty() {
            return;
        }

        info!(count = drained.len(), "stopping all watches");
        for entry in &drained {
            entry.request_stop();
        }
        wait_stopped(&drained).await;
    }

    /// Stops every watch, then reconnects the backend
    ///
    /// `config` replaces the backend configuration, root prefix included;
    /// `None` reconnects with the current one. Watches are not re-established.
    /// Must not be awaited from a handler; see [`watch`](Self::watch).
    ///
    /// # Errors
    /// - [`crate::Error::Config`] if `config` is invalid; watches are kept
    /// - [`crate::Error::Backend`] if the new connection fails; watches are
    ///   stopped and the previous connection stays in use
    pub async fn reset(
        &self,
        config: Option<BackendConfig>,
    ) -> Result<()> {
        let config = config.unwrap_or_else(|| self.inner.load().config.clone());
        config.validate()?;

        let _lifecycle = self.lifecycle.write().await;
        self.stop_all().await;
        debug_assert!(self.registry.is_empty());

        let backend = self.connector.connect(&config).await?;
        info!(root_prefix = %config.root_prefix, "backend reset");
        self.inner.store(Arc::new(ClientInner { backend, config }));
        Ok(())
    }

    /// Whether `path` currently has an active watch
    pub fn is_watching(
        &self,
        path: &str,
    ) -> bool {
        let key = abs_path(&self.root_prefix(), &[path]);
        self.registry.lookup(&key).is_some()
    }

    /// Watched paths relative to the root prefix, sorted
    pub fn watched_paths(&self) -> Vec<String> {
        let root = self.root_prefix();
        self.registry.paths().iter().map(|path| rel_key(&root, path)).collect()
    }
}

async fn wait_stopped(entries: &[Arc<WatchEntry>]) {
    join_all(entries.iter().map(|entry| entry.wait_stopped())).await;
}
