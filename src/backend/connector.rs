use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::KvBackend;
use super::MemoryBackend;
use super::SledBackend;
use crate::BackendConfig;
use crate::BackendKind;
use crate::Result;

/// Establishes backend connections for client init and reset
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn KvBackend>>;
}

/// Any `Fn(&BackendConfig) -> Result<Arc<dyn KvBackend>>` is a connector.
#[async_trait]
impl<F> Connector for F
where
    F: Fn(&BackendConfig) -> Result<Arc<dyn KvBackend>> + Send + Sync + 'static,
{
    async fn connect(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn KvBackend>> {
        self(config)
    }
}

/// Connector for the built-in backends
///
/// The memory store outlives individual connections so that a reset keeps
/// its data. Sled databases are cached per directory because a directory can
/// only be opened once per process.
#[derive(Default)]
pub struct DefaultConnector {
    memory: Arc<MemoryBackend>,
    sled_dbs: Mutex<HashMap<PathBuf, sled::Db>>,
}

impl DefaultConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared in-process store
    pub fn memory(&self) -> Arc<MemoryBackend> {
        self.memory.clone()
    }

    fn sled_db(
        &self,
        address: &str,
    ) -> Result<sled::Db> {
        let path = PathBuf::from(address);
        let mut dbs = self.sled_dbs.lock();
        if let Some(db) = dbs.get(&path) {
            return Ok(db.clone());
        }
        let db = SledBackend::open_db(&path)?;
        dbs.insert(path, db.clone());
        Ok(db)
    }
}

#[async_trait]
impl Connector for DefaultConnector {
    async fn connect(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn KvBackend>> {
        info!(kind = ?config.kind, address = %config.address, "connecting backend");
        match config.kind {
            BackendKind::Memory => Ok(self.memory.clone()),
            BackendKind::Sled => {
                let db = self.sled_db(&config.address)?;
                Ok(Arc::new(SledBackend::new(&db)?))
            }
        }
    }
}
