//! SIGINT/SIGTERM/SIGQUIT handling (spec §4.2 "Abort handling"): catching
//! any of the three sets a flag the main loop checks once per iteration,
//! rather than unwinding out of the middle of a dispatch or wait phase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

/// Shared between the signal-listening tasks and the engine's main loop.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Spawns one task per signal kind, each setting `flag` and returning on
/// first delivery. The tasks outlive this function; they are only ever
/// torn down by process exit, matching the engine's one-shot-per-run
/// lifetime.
pub fn install(flag: AbortFlag) -> std::io::Result<()> {
    for kind in [SignalKind::interrupt(), SignalKind::terminate(), SignalKind::quit()] {
        let mut stream = signal(kind)?;
        let flag = flag.clone();
        tokio::spawn(async move {
            stream.recv().await;
            flag.set();
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
