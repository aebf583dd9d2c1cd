use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::WaitForCancellationFuture;
use tracing::trace;

use crate::utils::path::rel_key;
use crate::KvPair;
use crate::ValueCell;

/// Callback invoked once per delivered change
pub type WatchHandler = Arc<dyn Fn(ValueCell) + Send + Sync>;

/// Lifecycle of a watch: `Running -> StopRequested -> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Running,
    StopRequested,
    Stopped,
}

/// Per-path subscription state shared by the registry and the reconnect loop
pub struct WatchEntry {
    path: String,
    root_prefix: String,
    /// Relative key -> last delivered payload. Only the owning loop writes it.
    snapshot: Mutex<HashMap<String, Bytes>>,
    handler: WatchHandler,
    cancel: CancellationToken,
    state: watch::Sender<WatchState>,
}

impl fmt::Debug for WatchEntry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchEntry")
            .field("path", &self.path)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WatchEntry {
    pub(crate) fn new(
        path: impl Into<String>,
        root_prefix: impl Into<String>,
        handler: WatchHandler,
    ) -> Self {
        let (state, _) = watch::channel(WatchState::Running);
        Self {
            path: path.into(),
            root_prefix: root_prefix.into(),
            snapshot: Mutex::new(HashMap::new()),
            handler,
            cancel: CancellationToken::new(),
            state,
        }
    }

    /// Absolute watched path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Signals the loop to stop. Returns false if a stop was already requested.
    pub fn request_stop(&self) -> bool {
        let transitioned = self.state.send_if_modified(|state| {
            if *state == WatchState::Running {
                *state = WatchState::StopRequested;
                true
            } else {
                false
            }
        });
        self.cancel.cancel();
        transitioned
    }

    /// Called by the loop on exit
    pub(crate) fn mark_stopped(&self) {
        self.request_stop();
        self.state.send_if_modified(|state| {
            if *state == WatchState::StopRequested {
                *state = WatchState::Stopped;
                true
            } else {
                false
            }
        });
    }

    /// Resolves once the owning loop has exited
    pub async fn wait_stopped(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = state.wait_for(|s| *s == WatchState::Stopped).await;
    }

    /// Last delivered payload for a relative key
    pub fn snapshot_value(
        &self,
        key: &str,
    ) -> Option<Bytes> {
        self.snapshot.lock().get(key).cloned()
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.lock().len()
    }

    /// Diffs a full listing of the watched prefix against the snapshot and
    /// invokes the handler once per changed key. Keys missing from the
    /// listing are delivered as deletions. Returns the number of deliveries.
    pub(crate) fn apply(
        &self,
        pairs: Vec<KvPair>,
    ) -> usize {
        let changes = self.diff(pairs);
        let delivered = changes.len();

        for cell in changes {
            trace!(path = %self.path, key = cell.key(), deleted = cell.is_deleted(), "delivering change");
            (self.handler)(cell);
        }

        delivered
    }

    fn diff(
        &self,
        pairs: Vec<KvPair>,
    ) -> Vec<ValueCell> {
        let mut snapshot = self.snapshot.lock();
        let mut seen = HashSet::with_capacity(pairs.len());
        let mut changes = Vec::new();

        for pair in pairs {
            let key = rel_key(&self.root_prefix, &pair.key);
            seen.insert(key.clone());
            if record(&mut snapshot, &key, &pair.value) {
                changes.push(ValueCell::new(key, pair.value));
            }
        }

        let mut vanished: Vec<String> = snapshot.keys().filter(|k| !seen.contains(*k)).cloned().collect();
        vanished.sort();
        for key in vanished {
            snapshot.remove(&key);
            changes.push(ValueCell::new(key, Bytes::new()));
        }

        changes
    }
}

/// Updates `snapshot` and reports whether `value` is a real change.
/// Both-empty is not a change; an empty value removes the key.
fn record(
    snapshot: &mut HashMap<String, Bytes>,
    key: &str,
    value: &Bytes,
) -> bool {
    let unchanged = match snapshot.get(key) {
        None => value.is_empty(),
        Some(previous) => previous == value,
    };
    if unchanged {
        return false;
    }

    if value.is_empty() {
        snapshot.remove(key);
    } else {
        snapshot.insert(key.to_string(), value.clone());
    }
    true
}
