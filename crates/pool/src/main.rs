//! `flowctl-pool`: the adaptive worker-pool controller binary entrypoint.

use flowctl_core::SystemClock;
use flowctl_pool::{NoDirectoryClient, PoolConfig, PoolController};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("FLOWCTL_POOL_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(arg) = std::env::args().nth(1) {
        return PathBuf::from(arg);
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("flowctl").join("pool.toml")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = config_path();
    let config = PoolConfig::load(&path)?;
    let work_dir = std::env::current_dir()?;
    let queue: Arc<dyn flowctl_queue::BatchQueue> = Arc::from(flowctl_queue::create(config.backend, &work_dir)?);

    // The catalog/directory-service transport is an external collaborator
    // (spec §1 "Non-goals"); wiring a real one is left to whatever
    // deployment glues this binary to a catalog. Without one configured,
    // every cycle fails clearly instead of silently never provisioning.
    let directory = Arc::new(NoDirectoryClient);

    let mut controller = PoolController::new(config, Some(path), directory, queue, SystemClock);

    let stop = Arc::new(AtomicBool::new(false));
    for kind in [SignalKind::interrupt(), SignalKind::terminate(), SignalKind::quit()] {
        let mut stream = signal(kind)?;
        let stop = stop.clone();
        tokio::spawn(async move {
            stream.recv().await;
            stop.store(true, Ordering::SeqCst);
        });
    }

    controller.run(|| stop.load(Ordering::SeqCst)).await?;
    Ok(())
}
