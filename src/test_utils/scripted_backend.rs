use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;

use crate::BackendError;
use crate::Error;
use crate::KvBackend;
use crate::KvPair;
use crate::QueryOptions;
use crate::QueryResult;
use crate::Result;

/// Backend whose blocking queries answer with scripted responses
///
/// A query parks until the test pushes the next response, which makes each
/// loop iteration observable. `queries()` counts queries that have started;
/// once it reaches `n + 1`, the loop has fully processed response `n`.
pub struct ScriptedBackend {
    sender: mpsc::UnboundedSender<Result<QueryResult>>,
    responses: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<QueryResult>>>,
    started: watch::Sender<usize>,
    options: Mutex<Vec<QueryOptions>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (started, _) = watch::channel(0);
        Self {
            sender,
            responses: tokio::sync::Mutex::new(receiver),
            started,
            options: Mutex::new(Vec::new()),
        }
    }

    pub fn push_pairs(
        &self,
        index: u64,
        pairs: &[(&str, &str)],
    ) {
        let pairs = pairs.iter().map(|(k, v)| KvPair::new(k.to_string(), v.to_string())).collect();
        let _ = self.sender.send(Ok(QueryResult { index, pairs }));
    }

    pub fn push_error(&self) {
        let _ = self
            .sender
            .send(Err(Error::Backend(BackendError::Unavailable("scripted outage".to_string()))));
    }

    pub fn queries(&self) -> usize {
        *self.started.borrow()
    }

    /// Options of every query issued so far
    pub fn options(&self) -> Vec<QueryOptions> {
        self.options.lock().clone()
    }

    pub async fn wait_for_queries(
        &self,
        n: usize,
    ) {
        let mut started = self.started.subscribe();
        tokio::time::timeout(Duration::from_secs(30), started.wait_for(|count| *count >= n))
            .await
            .expect("loop did not issue the expected queries")
            .expect("scripted backend dropped");
    }
}

#[async_trait]
impl KvBackend for ScriptedBackend {
    async fn list(
        &self,
        _prefix: &str,
    ) -> Result<Vec<KvPair>> {
        Ok(Vec::new())
    }

    async fn put(
        &self,
        _key: &str,
        _value: Bytes,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete(
        &self,
        _key: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn blocking_list(
        &self,
        _prefix: &str,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        self.options.lock().push(options);
        self.started.send_modify(|count| *count += 1);

        let mut responses = self.responses.lock().await;
        match responses.recv().await {
            Some(response) => response,
            None => std::future::pending().await,
        }
    }
}
