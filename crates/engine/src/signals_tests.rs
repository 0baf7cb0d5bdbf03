use super::*;
use nix::sys::signal::{raise, Signal};
use std::time::Duration;

#[tokio::test]
async fn flag_starts_clear() {
    let flag = AbortFlag::new();
    assert!(!flag.is_set());
}

#[tokio::test]
async fn self_sigterm_sets_the_flag() {
    let flag = AbortFlag::new();
    install(flag.clone()).unwrap();
    // Give the signal-listening tasks a chance to register before we
    // raise, then self-signal this very process.
    tokio::time::sleep(Duration::from_millis(20)).await;
    raise(Signal::SIGTERM).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(flag.is_set());
}
