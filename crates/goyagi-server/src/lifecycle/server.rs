//! HTTP server lifecycle: bind, serve, drain, stop.
//!
//! States only move forward: `Created -> Serving -> Draining -> Stopped`.
//! Each accepted connection runs in its own tracked task. When the shutdown
//! notification fires the listener is dropped, every connection is asked to
//! finish its current request and close, and the whole drain is bounded by a
//! deadline after which the remaining connections are dropped.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{response::Response, Router};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

use goyagi_core::error::{GoyagiError, Result};

use crate::lifecycle::signals::Shutdown;

/// Backoff after an accept error that is not tied to a single connection
/// (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Serving,
    Draining,
    Stopped,
}

/// Connections still open when the drain deadline elapsed.
#[derive(Debug, Error)]
#[error("drain deadline of {deadline:?} elapsed with {remaining} connection(s) open")]
pub struct DrainTimeout {
    pub deadline: Duration,
    pub remaining: usize,
}

/// A server that has not bound its listener yet.
pub struct Server {
    router: Router,
    drain_timeout: Duration,
    state: watch::Sender<ServerState>,
}

impl Server {
    pub fn new(router: Router, drain_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ServerState::Created);
        Self {
            router,
            drain_timeout,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Bind `addr` and start accepting connections.
    pub async fn bind(self, addr: SocketAddr) -> Result<Listening> {
        let listener = TcpListener::bind(addr).await.map_err(|source| GoyagiError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| GoyagiError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        self.state.send_replace(ServerState::Serving);
        tracing::info!(%local_addr, "listener bound");

        Ok(Listening {
            listener,
            local_addr,
            router: self.router,
            drain_timeout: self.drain_timeout,
            state: self.state,
        })
    }
}

/// A bound server, ready to serve.
pub struct Listening {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    drain_timeout: Duration,
    state: watch::Sender<ServerState>,
}

impl Listening {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Serve until `shutdown` fires and the drain completes.
    ///
    /// Returns `Ok(())` on a normal stop, including a drain that hit its
    /// deadline.
    pub async fn serve(self, shutdown: Shutdown) -> Result<()> {
        let Listening {
            listener,
            local_addr,
            router,
            drain_timeout,
            state,
        } = self;

        let tracker = TaskTracker::new();
        let drain = CancellationToken::new();
        let force = CancellationToken::new();

        let waiter = tokio::spawn({
            let drain = drain.clone();
            async move {
                shutdown.wait().await;
                drain.cancel();
            }
        });

        loop {
            tokio::select! {
                biased;
                _ = drain.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        tracker.spawn(serve_connection(
                            stream,
                            remote,
                            router.clone(),
                            drain.clone(),
                            force.clone(),
                        ));
                    }
                    Err(e) if is_connection_error(&e) => {
                        tracing::debug!(error = %e, "accept failed for one connection");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        state.send_replace(ServerState::Draining);
        tracker.close();
        tracing::info!(%local_addr, open = tracker.len(), "draining connections");

        if tokio::time::timeout(drain_timeout, tracker.wait()).await.is_err() {
            let e = DrainTimeout {
                deadline: drain_timeout,
                remaining: tracker.len(),
            };
            tracing::warn!(error = %e, "closing remaining connections");
            force.cancel();
            tracker.wait().await;
        }

        state.send_replace(ServerState::Stopped);
        tracing::info!(%local_addr, "server stopped");

        waiter
            .await
            .map_err(|e| GoyagiError::Internal(format!("shutdown waiter failed: {e}")))
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    router: Router,
    drain: CancellationToken,
    force: CancellationToken,
) {
    let svc = service_fn(move |req: hyper::Request<Incoming>| {
        let router = router.clone();
        async move {
            let res: std::result::Result<Response, Infallible> =
                router.oneshot(req.map(axum::body::Body::new)).await;
            res
        }
    });

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(TokioIo::new(stream), svc);
    let mut conn = std::pin::pin!(conn);
    let mut draining = false;

    loop {
        tokio::select! {
            res = conn.as_mut() => {
                if let Err(e) = res {
                    tracing::debug!(%remote, error = %e, "connection error");
                }
                return;
            }
            _ = drain.cancelled(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
            _ = force.cancelled() => {
                tracing::debug!(%remote, "connection force-closed");
                return;
            }
        }
    }
}

fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}
