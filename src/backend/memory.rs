use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;
use tracing::trace;

use super::KvBackend;
use super::QueryOptions;
use super::QueryResult;
use crate::BackendError;
use crate::KvPair;
use crate::Result;

/// Change signal published to blocked queries
#[derive(Debug, Clone, Copy)]
struct Signal {
    index: u64,
    available: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    data: BTreeMap<String, Bytes>,
    index: u64,
}

/// In-process store with long-poll support
///
/// Every committed write bumps a store-wide index, so a blocking query on
/// one prefix also wakes up when an unrelated prefix changes. Watchers rely
/// on their snapshot diff to filter those wake-ups.
///
/// [`set_available`](Self::set_available) simulates a connection outage:
/// while offline every call fails with [`BackendError::Unavailable`] and
/// blocked queries are released with that error.
#[derive(Debug)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    signal: watch::Sender<Signal>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(Signal {
            index: 1,
            available: true,
        });
        Self {
            state: RwLock::new(MemoryState {
                data: BTreeMap::new(),
                index: 1,
            }),
            signal,
        }
    }

    /// Toggles the simulated connection
    pub fn set_available(
        &self,
        available: bool,
    ) {
        debug!(available, "memory backend availability changed");
        self.signal.send_modify(|s| s.available = available);
    }

    pub fn is_available(&self) -> bool {
        self.signal.borrow().available
    }

    /// Current store index
    pub fn index(&self) -> u64 {
        self.state.read().index
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(BackendError::Unavailable("memory backend is offline".to_string()).into())
        }
    }

    fn commit<F>(
        &self,
        mutate: F,
    ) where
        F: FnOnce(&mut BTreeMap<String, Bytes>) -> bool,
    {
        let index = {
            let mut state = self.state.write();
            if !mutate(&mut state.data) {
                return;
            }
            state.index += 1;
            state.index
        };
        self.signal.send_modify(|s| s.index = index);
    }

    fn snapshot(
        &self,
        prefix: &str,
    ) -> QueryResult {
        let state = self.state.read();
        let pairs = state
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KvPair::new(k.clone(), v.clone()))
            .collect();

        QueryResult {
            index: state.index,
            pairs,
        }
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn list(
        &self,
        prefix: &str,
    ) -> Result<Vec<KvPair>> {
        self.ensure_available()?;
        let mut pairs = self.snapshot(prefix).pairs;
        pairs.retain(|p| !p.value.is_empty());
        Ok(pairs)
    }

    async fn put(
        &self,
        key: &str,
        value: Bytes,
    ) -> Result<()> {
        self.ensure_available()?;
        self.commit(|data| {
            data.insert(key.to_string(), value);
            true
        });
        Ok(())
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<()> {
        self.ensure_available()?;
        self.commit(|data| data.remove(key).is_some());
        Ok(())
    }

    async fn blocking_list(
        &self,
        prefix: &str,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        let mut signal = self.signal.subscribe();
        {
            let current = signal.borrow_and_update();
            if !current.available {
                return Err(BackendError::Unavailable("memory backend is offline".to_string()).into());
            }
            if options.wait_index == 0 || current.index > options.wait_index {
                return Ok(self.snapshot(prefix));
            }
        }

        trace!(prefix, wait_index = options.wait_index, "blocking query parked");
        let timed_out = tokio::time::timeout(
            options.wait_time,
            signal.wait_for(|s| !s.available || s.index > options.wait_index),
        )
        .await
        .is_err();
        if timed_out {
            trace!(prefix, "blocking query timed out");
        }

        self.ensure_available()?;
        Ok(self.snapshot(prefix))
    }
}
