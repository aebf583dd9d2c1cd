use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::ValueCell;
use crate::WatchHandler;

/// Handler that records every delivered cell
#[derive(Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<ValueCell>>>,
    count: Arc<watch::Sender<usize>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(count),
        }
    }

    pub fn handler(&self) -> WatchHandler {
        let recorder = self.clone();
        Arc::new(move |cell: ValueCell| recorder.record(cell))
    }

    pub fn record(
        &self,
        cell: ValueCell,
    ) {
        self.calls.lock().push(cell);
        self.count.send_modify(|c| *c += 1);
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (key, value) of every call, in delivery order
    pub fn calls(&self) -> Vec<(String, Bytes)> {
        self.calls.lock().iter().map(|c| (c.key().to_string(), c.value().clone())).collect()
    }

    pub async fn wait_for(
        &self,
        n: usize,
    ) {
        let mut count = self.count.subscribe();
        tokio::time::timeout(Duration::from_secs(30), count.wait_for(|c| *c >= n))
            .await
            .expect("handler was not called often enough")
            .expect("recorder dropped");
    }
}
