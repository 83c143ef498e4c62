//! Real OS signals through `lifecycle::setup`.
//!
//! Lives in its own test binary: the handlers it installs are process-wide.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::process::Command;
use std::time::Duration;

use goyagi_server::lifecycle::{setup, Shutdown};

fn send_to_self(signal: &str) {
    let status = Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(std::process::id().to_string())
        .status()
        .expect("run kill");
    assert!(status.success(), "kill -{signal} failed: {status}");
}

async fn fired(shutdown: &Shutdown) -> bool {
    tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
        .await
        .is_ok()
}

#[tokio::test]
async fn sigterm_right_after_setup_fires_once() {
    let shutdown = setup();
    // No yield between subscribing and the first signal.
    send_to_self("TERM");
    send_to_self("TERM");

    assert!(fired(&shutdown).await, "SIGTERM did not fire the shutdown");
    assert!(!shutdown.trigger(), "shutdown fired more than once");

    // Later signals are swallowed, not the default terminate action.
    send_to_self("TERM");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(shutdown.is_triggered());
}

#[tokio::test]
async fn sigint_fires_shutdown() {
    let shutdown = setup();
    send_to_self("INT");

    assert!(fired(&shutdown).await, "SIGINT did not fire the shutdown");
    assert!(!shutdown.trigger());
}
