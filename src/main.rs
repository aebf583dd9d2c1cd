use config::ConfigError;
use kv_watch::Error;
use kv_watch::KvWatchClient;
use kv_watch::KvWatchConfig;
use kv_watch::LogConfig;
use kv_watch::Result;
use kv_watch::LOG_FILE_NAME;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = KvWatchConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&config.log)?;

    let client = KvWatchClient::builder(config).build().await?;

    client
        .watch("test", |cell| {
            info!(key = cell.key(), value = ?cell.as_str(), deleted = cell.is_deleted(), "change received");
        })
        .await?;
    client.put("test", "value").await?;

    let cell = client.get(&["test"]).await;
    match cell.err() {
        Some(e) => error!(error = %e, "read back failed"),
        None => println!("{} = {}", cell.key(), cell.as_str().unwrap_or_default()),
    }

    info!("Application started. Waiting for shutdown signal...");
    wait_for_shutdown().await?;

    client.stop_watch(&[]).await;
    println!("Exiting program.");
    Ok(())
}

/// Returns on SIGINT, SIGTERM or SIGQUIT. SIGHUP is ignored.
async fn wait_for_shutdown() -> Result<()> {
    let mut sigint = listen(SignalKind::interrupt())?;
    let mut sigterm = listen(SignalKind::terminate())?;
    let mut sigquit = listen(SignalKind::quit())?;
    let mut sighup = listen(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("SIGINT detected.");
                break;
            },
            _ = sigterm.recv() => {
                info!("SIGTERM detected.");
                break;
            },
            _ = sigquit.recv() => {
                info!("SIGQUIT detected.");
                break;
            },
            _ = sighup.recv() => {
                warn!("SIGHUP ignored.");
            },
        }
    }

    info!("Shutdown started");
    Ok(())
}

fn listen(kind: SignalKind) -> Result<tokio::signal::unix::Signal> {
    signal(kind).map_err(|e| Error::Fatal(format!("Failed to install signal handler: {e}")))
}

fn env_filter(log: &LogConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&log.level)
        .map_err(|e| Error::Config(ConfigError::Message(format!("invalid log.level {:?}: {e}", log.level))))
}

/// Logs to stdout, and to `log_dir` when one is configured
pub fn init_observability(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(env_filter(log)?);

    if log.log_dir.is_empty() {
        tracing_subscriber::registry().with(stdout_layer).init();
        return Ok(None);
    }

    let log_file = tracing_appender::rolling::never(&log.log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(env_filter(log)?);
    tracing_subscriber::registry().with(stdout_layer).with(file_layer).init();

    Ok(Some(guard))
}
