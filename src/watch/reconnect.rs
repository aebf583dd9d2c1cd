use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::Instrument;
use tracing::warn;

use super::WatchEntry;
use crate::KvBackend;
use crate::QueryOptions;
use crate::QueryResult;
use crate::WatchConfig;

/// Marks the entry stopped however the loop exits, panics included.
struct StopGuard(Arc<WatchEntry>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.mark_stopped();
        info!(path = %self.0.path(), "watcher stop");
    }
}

/// Long-poll loop driving one [`WatchEntry`]
///
/// Each iteration issues one blocking query for the entry's path, diffs the
/// answer into the entry and re-issues with the returned index. Failed
/// queries are retried forever after a fixed delay and never reach the
/// handler. The loop exits only when the entry's stop is requested, either
/// between iterations or while parked in a query or a backoff sleep.
pub(crate) struct ReconnectLoop {
    entry: Arc<WatchEntry>,
    backend: Arc<dyn KvBackend>,
    retry_delay: Duration,
    wait_time: Duration,
}

impl ReconnectLoop {
    pub(crate) fn new(
        entry: Arc<WatchEntry>,
        backend: Arc<dyn KvBackend>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            entry,
            backend,
            retry_delay: config.retry_delay(),
            wait_time: config.wait_time(),
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run().in_current_span())
    }

    /// The guard is armed before the first poll, so a task dropped by a
    /// shutting-down runtime still reports Stopped.
    pub(crate) fn run(self) -> impl Future<Output = ()> + Send + 'static {
        let guard = StopGuard(self.entry.clone());
        async move {
            let _guard = guard;
            self.drive().await
        }
    }

    async fn drive(self) {
        let entry = self.entry.clone();
        let path = entry.path().to_string();
        info!(%path, "watcher start");

        let mut wait_index = 0;
        loop {
            if entry.is_stop_requested() {
                break;
            }

            let options = QueryOptions {
                wait_index,
                wait_time: self.wait_time,
            };
            let result = tokio::select! {
                biased;
                _ = entry.cancelled() => break,
                result = self.backend.blocking_list(&path, options) => result,
            };

            match result {
                Ok(QueryResult { index, pairs }) => {
                    // An index going backwards means the store was rebuilt
                    wait_index = if index < wait_index { 0 } else { index };
                    let delivered = entry.apply(pairs);
                    debug!(%path, index, delivered, "blocking query returned");
                }
                Err(e) => {
                    warn!(%path, error = %e, "watcher connect error");
                    wait_index = 0;

                    tokio::select! {
                        biased;
                        _ = entry.cancelled() => break,
                        _ = sleep(self.retry_delay) => {}
                    }
                    if entry.is_stop_requested() {
                        break;
                    }
                    warn!(%path, "watcher reconnect...");
                }
            }
        }
    }
}
