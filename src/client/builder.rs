use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::RwLock;
use tracing::info;

use super::ClientInner;
use super::KvWatchClient;
use crate::Connector;
use crate::DefaultConnector;
use crate::KvWatchConfig;
use crate::Result;
use crate::WatchRegistry;

pub struct KvWatchClientBuilder {
    config: KvWatchConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl KvWatchClientBuilder {
    /// Create a new builder from a loaded configuration
    pub fn new(config: KvWatchConfig) -> Self {
        Self {
            config,
            connector: None,
        }
    }

    /// Set the prefix every path is resolved under (default: store root)
    pub fn root_prefix(
        mut self,
        prefix: impl Into<String>,
    ) -> Self {
        self.config.backend.root_prefix = prefix.into();
        self
    }

    /// Set the backoff after a failed blocking query (default: 3s)
    ///
    /// Delays beyond `u64::MAX` milliseconds saturate and fail validation.
    pub fn retry_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.config.watch.retry_delay_ms = millis(delay);
        self
    }

    /// Set the longest wait of one blocking query (default: 5min)
    ///
    /// Waits beyond `u64::MAX` milliseconds saturate.
    pub fn wait_time(
        mut self,
        wait: Duration,
    ) -> Self {
        self.config.watch.wait_time_ms = millis(wait);
        self
    }

    /// Replace the backend factory used by `build` and
    /// [`reset`](KvWatchClient::reset)
    ///
    /// Defaults to [`DefaultConnector`].
    pub fn connector<C: Connector>(
        self,
        connector: C,
    ) -> Self {
        self.shared_connector(Arc::new(connector))
    }

    /// Like [`connector`](Self::connector), for a connector the caller keeps
    /// a handle to
    pub fn shared_connector(
        mut self,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Validate the configuration and connect the backend
    pub async fn build(self) -> Result<KvWatchClient> {
        let config = self.config.validate()?;
        let connector = self.connector.unwrap_or_else(|| Arc::new(DefaultConnector::new()));

        let backend = connector.connect(&config.backend).await?;
        info!(
            root_prefix = %config.backend.root_prefix,
            retry_delay_ms = config.watch.retry_delay_ms,
            "watch client initialized"
        );

        Ok(KvWatchClient {
            inner: Arc::new(ArcSwap::from_pointee(ClientInner {
                backend,
                config: config.backend,
            })),
            registry: Arc::new(WatchRegistry::new()),
            connector,
            watch_config: config.watch,
            lifecycle: Arc::new(RwLock::new(())),
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
