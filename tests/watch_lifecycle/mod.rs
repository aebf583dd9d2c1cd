use kv_watch::Error;
use tracing_test::traced_test;

use crate::common::change;
use crate::common::channel_handler;
use crate::common::memory_client;

#[tokio::test]
#[traced_test]
async fn test_value_duplicate_then_delete() -> Result<(), Box<dyn std::error::Error>> {
    let (client, _) = memory_client().await;
    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;

    client.put("test", "value").await?;
    assert_eq!(changes.next().await, change("test", "value"));

    client.put("test", "value").await?;
    changes.assert_quiet().await;

    client.put("test", "").await?;
    assert_eq!(changes.next().await, change("test", ""));
    changes.assert_quiet().await;

    client.stop_watch(&["test"]).await;
    Ok(())
}

#[tokio::test]
async fn test_prefix_watch_reports_each_key_and_deletions() -> Result<(), Box<dyn std::error::Error>> {
    let (client, _) = memory_client().await;
    let (handler, mut changes) = channel_handler();
    client.watch("svc", handler).await?;

    client.put("svc/a", "1").await?;
    assert_eq!(changes.next().await, change("svc/a", "1"));
    client.put("svc/b", "2").await?;
    assert_eq!(changes.next().await, change("svc/b", "2"));

    // Unrelated keys wake the loop but are filtered by the snapshot
    client.put("other", "x").await?;
    changes.assert_quiet().await;

    client.delete("svc/a").await?;
    assert_eq!(changes.next().await, change("svc/a", ""));
    changes.assert_quiet().await;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_watch_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (client, _) = memory_client().await;
    let (first, mut first_changes) = channel_handler();
    let (second, mut second_changes) = channel_handler();
    client.watch("test", first).await?;

    let result = client.watch("test", second).await;
    assert!(matches!(result, Err(Error::AlreadyWatching { .. })));

    client.put("test", "value").await?;
    assert_eq!(first_changes.next().await, change("test", "value"));
    second_changes.assert_quiet().await;
    Ok(())
}

#[tokio::test]
async fn test_rewatch_after_stop_starts_from_fresh_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let (client, _) = memory_client().await;
    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;
    client.put("test", "value").await?;
    assert_eq!(changes.next().await, change("test", "value"));

    client.stop_watch(&["test"]).await;
    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;

    // Current value is delivered again to the new watch
    assert_eq!(changes.next().await, change("test", "value"));
    Ok(())
}

#[tokio::test]
async fn test_reset_drops_watches_until_reestablished() -> Result<(), Box<dyn std::error::Error>> {
    let (client, _) = memory_client().await;
    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;

    client.reset(None).await?;
    assert!(client.watched_paths().is_empty());

    client.put("test", "value").await?;
    changes.assert_quiet().await;

    let (handler, mut changes) = channel_handler();
    client.watch("test", handler).await?;
    assert_eq!(changes.next().await, change("test", "value"));
    Ok(())
}
