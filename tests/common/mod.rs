use std::sync::Arc;
use std::time::Duration;

use kv_watch::BackendConfig;
use kv_watch::KvBackend;
use kv_watch::KvWatchClient;
use kv_watch::KvWatchConfig;
use kv_watch::MemoryBackend;
use kv_watch::Result;
use kv_watch::ValueCell;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const RETRY_DELAY_IN_MS: u64 = 50;

// long enough for a woken loop to deliver, short enough to keep tests fast
pub const QUIET_PERIOD_IN_MS: u64 = 200;

pub const ROOT_PREFIX: &str = "kvTest";

pub async fn memory_client() -> (KvWatchClient, Arc<MemoryBackend>) {
    let memory = Arc::new(MemoryBackend::new());
    let backend = memory.clone();
    let client = KvWatchClient::builder(KvWatchConfig::default())
        .root_prefix(ROOT_PREFIX)
        .retry_delay(Duration::from_millis(RETRY_DELAY_IN_MS))
        .connector(move |_: &BackendConfig| -> Result<Arc<dyn KvBackend>> { Ok(backend.clone()) })
        .build()
        .await
        .expect("build client");
    (client, memory)
}

/// Handler forwarding every cell to a channel the test reads from
pub fn channel_handler() -> (impl Fn(ValueCell) + Send + Sync + 'static, Changes) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |cell: ValueCell| {
            let _ = tx.send(cell);
        },
        Changes { rx },
    )
}

pub struct Changes {
    rx: mpsc::UnboundedReceiver<ValueCell>,
}

impl Changes {
    /// Next delivered change as (relative key, utf-8 value)
    pub async fn next(&mut self) -> (String, String) {
        let cell = timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("no change delivered in time")
            .expect("handler dropped");
        (cell.key().to_string(), cell.as_str().unwrap_or_default().to_string())
    }

    pub async fn assert_quiet(&mut self) {
        let extra = timeout(Duration::from_millis(QUIET_PERIOD_IN_MS), self.rx.recv()).await;
        if let Ok(Some(cell)) = extra {
            panic!("unexpected change delivered: {cell:?}");
        }
    }
}

pub fn change(
    key: &str,
    value: &str,
) -> (String, String) {
    (key.to_string(), value.to_string())
}
