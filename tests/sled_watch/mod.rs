use kv_watch::BackendConfig;
use kv_watch::BackendKind;
use kv_watch::KvWatchClient;
use kv_watch::KvWatchConfig;
use tempfile::TempDir;

use crate::common::change;
use crate::common::channel_handler;
use crate::common::ROOT_PREFIX;

fn sled_config(dir: &TempDir) -> KvWatchConfig {
    let mut config = KvWatchConfig::default();
    config.backend = BackendConfig::default()
        .with_kind(BackendKind::Sled)
        .with_address(dir.path().join("db").to_string_lossy())
        .with_root_prefix(ROOT_PREFIX);
    config.watch.retry_delay_ms = 50;
    config
}

#[tokio::test]
async fn test_sled_watch_put_get_delete() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let client = KvWatchClient::builder(sled_config(&dir)).build().await?;
    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;

    client.put("test", "value").await?;
    assert_eq!(changes.next().await, change("test", "value"));
    assert_eq!(client.get(&["test"]).await.as_str(), Some("value"));

    client.delete("test").await?;
    assert_eq!(changes.next().await, change("test", ""));
    assert!(client.get(&["test"]).await.err().is_some());

    client.stop_watch(&[]).await;
    Ok(())
}

#[tokio::test]
async fn test_reset_switches_between_backends() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = sled_config(&dir);
    let sled_backend = config.backend.clone();
    let client = KvWatchClient::builder(config).build().await?;
    client.put("test", "on-disk").await?;

    client.reset(Some(BackendConfig::default().with_root_prefix(ROOT_PREFIX))).await?;
    assert!(client.get(&["test"]).await.err().is_some());

    // Reopening the same directory reuses the cached database
    client.reset(Some(sled_backend)).await?;
    assert_eq!(client.get(&["test"]).await.as_str(), Some("on-disk"));
    Ok(())
}
