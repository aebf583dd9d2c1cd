use std::time::Duration;

use tokio::time::sleep;
use tracing_test::traced_test;

use crate::common::change;
use crate::common::channel_handler;
use crate::common::memory_client;
use crate::common::RETRY_DELAY_IN_MS;

#[tokio::test]
#[traced_test]
async fn test_watch_survives_outage_without_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let (client, memory) = memory_client().await;
    let (handler, mut changes) = channel_handler();
    client.put("test", "before").await?;
    client.watch("test", handler).await?;
    assert_eq!(changes.next().await, change("test", "before"));

    memory.set_available(false);
    sleep(Duration::from_millis(RETRY_DELAY_IN_MS * 4)).await;
    changes.assert_quiet().await;

    memory.set_available(true);
    // The full re-read after reconnecting matches the snapshot
    changes.assert_quiet().await;

    client.put("test", "after").await?;
    assert_eq!(changes.next().await, change("test", "after"));
    assert!(client.is_watching("test"));
    Ok(())
}

#[tokio::test]
async fn test_watch_started_during_outage_delivers_once_online() -> Result<(), Box<dyn std::error::Error>> {
    let (client, memory) = memory_client().await;
    client.put("test", "value").await?;
    memory.set_available(false);

    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;
    changes.assert_quiet().await;

    memory.set_available(true);
    assert_eq!(changes.next().await, change("test", "value"));
    Ok(())
}

#[tokio::test]
async fn test_stop_during_outage_returns() -> Result<(), Box<dyn std::error::Error>> {
    let (client, memory) = memory_client().await;
    memory.set_available(false);
    let (handler, _changes) = channel_handler();
    client.watch("test", handler).await?;
    sleep(Duration::from_millis(RETRY_DELAY_IN_MS * 2)).await;

    tokio::time::timeout(Duration::from_secs(1), client.stop_watch(&["test"])).await?;

    assert!(!client.is_watching("test"));
    Ok(())
}
