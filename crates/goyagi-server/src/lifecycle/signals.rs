//! OS termination signals -> one-shot shutdown notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Shutdown notification shared by every component that waits on it.
///
/// Fires at most once; clones observe the same event.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the notification. Returns `true` only for the call that fired it.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the notification has fired.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Subscribe to SIGINT / SIGTERM and return the notification they fire.
///
/// The handlers are registered before this returns, so a signal that arrives
/// before the watcher task first runs is still observed. Must be called inside
/// a tokio runtime.
pub fn setup() -> Shutdown {
    let shutdown = Shutdown::new();
    let signals = TerminationSignals::install();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        if handle.trigger() {
            tracing::info!(%signal, "signal received, starting graceful shutdown");
        }
    });
    shutdown
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: Option<tokio::signal::unix::Signal>,
    terminate: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl TerminationSignals {
    fn install() -> Self {
        use tokio::signal::unix::SignalKind;

        Self {
            interrupt: install_unix(SignalKind::interrupt(), "SIGINT"),
            terminate: install_unix(SignalKind::terminate(), "SIGTERM"),
        }
    }

    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = recv_or_pending(&mut self.interrupt) => "SIGINT",
            _ = recv_or_pending(&mut self.terminate) => "SIGTERM",
        }
    }
}

// A source that failed to install never fires.
#[cfg(unix)]
fn install_unix(
    kind: tokio::signal::unix::SignalKind,
    name: &'static str,
) -> Option<tokio::signal::unix::Signal> {
    match tokio::signal::unix::signal(kind) {
        Ok(sig) => Some(sig),
        Err(e) => {
            tracing::warn!(signal = name, error = %e, "failed to install signal handler");
            None
        }
    }
}

#[cfg(unix)]
async fn recv_or_pending(sig: &mut Option<tokio::signal::unix::Signal>) {
    if let Some(sig) = sig {
        if sig.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await;
}

#[cfg(not(unix))]
struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    fn install() -> Self {
        Self
    }

    async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.clone().trigger());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn all_waiters_are_released() {
        let shutdown = Shutdown::new();
        let a = tokio::spawn({
            let s = shutdown.clone();
            async move { s.wait().await }
        });
        let b = tokio::spawn({
            let s = shutdown.clone();
            async move { s.wait().await }
        });

        shutdown.trigger();

        let joined = tokio::time::timeout(Duration::from_secs(1), async {
            a.await.is_ok() && b.await.is_ok()
        })
        .await;
        assert_eq!(joined.ok(), Some(true));
    }

    #[tokio::test]
    async fn setup_is_not_fired_without_a_signal() {
        let shutdown = setup();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!shutdown.is_triggered());
    }
}
