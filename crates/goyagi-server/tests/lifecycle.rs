//! Server lifecycle over real sockets: bind, serve, drain, stop.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use chrono::Utc;
use goyagi_core::error::{GoyagiError, Result};
use goyagi_core::model::NewMovie;
use goyagi_server::lifecycle::{Server, ServerState, Shutdown};

struct Running {
    addr: SocketAddr,
    shutdown: Shutdown,
    state: watch::Receiver<ServerState>,
    handle: JoinHandle<Result<()>>,
}

/// Router with `/fast` and a `/slow` route that signals `started` once the
/// handler runs, then sleeps for `slow`.
fn app(slow: Duration, started: Arc<Notify>) -> Router {
    Router::new().route("/fast", get(|| async { "fast" })).route(
        "/slow",
        get(move || {
            let started = started.clone();
            async move {
                started.notify_one();
                tokio::time::sleep(slow).await;
                "done"
            }
        }),
    )
}

async fn start(router: Router, drain: Duration) -> Running {
    let server = Server::new(router, drain);
    assert_eq!(*server.state().borrow(), ServerState::Created);

    let listening = server
        .bind("127.0.0.1:0".parse().unwrap())
        .await
        .expect("bind");
    let addr = listening.local_addr();
    let state = listening.state();
    assert_eq!(*state.borrow(), ServerState::Serving);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(listening.serve(shutdown.clone()));
    Running {
        addr,
        shutdown,
        state,
        handle,
    }
}

async fn http_get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[tokio::test]
async fn bind_conflict_is_a_bind_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let err = match Server::new(Router::new(), Duration::from_secs(1)).bind(addr).await {
        Ok(_) => panic!("second bind on {addr} must fail"),
        Err(e) => e,
    };
    assert!(matches!(err, GoyagiError::Bind { .. }), "got {err}");
}

#[tokio::test]
async fn serves_then_stops_on_shutdown() {
    let mut srv = start(app(Duration::ZERO, Arc::new(Notify::new())), Duration::from_secs(1)).await;

    let res = http_get(srv.addr, "/fast").await.unwrap();
    assert!(res.starts_with("HTTP/1.1 200"), "got {res}");
    assert!(res.ends_with("fast"));

    assert!(srv.shutdown.trigger());
    srv.handle.await.unwrap().expect("graceful stop");

    srv.state
        .wait_for(|s| *s == ServerState::Stopped)
        .await
        .unwrap();
}

#[tokio::test]
async fn in_flight_request_completes_within_deadline() {
    let started = Arc::new(Notify::new());
    let mut srv = start(
        app(Duration::from_millis(200), started.clone()),
        Duration::from_secs(1),
    )
    .await;

    let addr = srv.addr;
    let client = tokio::spawn(async move { http_get(addr, "/slow").await });
    started.notified().await;

    srv.shutdown.trigger();
    srv.state
        .wait_for(|s| *s != ServerState::Serving)
        .await
        .unwrap();

    // The listener is gone while the slow request is still running.
    assert!(TcpStream::connect(addr).await.is_err());

    let res = client.await.unwrap().expect("in-flight request");
    assert!(res.starts_with("HTTP/1.1 200"), "got {res}");
    assert!(res.ends_with("done"));

    srv.handle.await.unwrap().expect("graceful stop");
    assert_eq!(*srv.state.borrow(), ServerState::Stopped);
}

#[tokio::test]
async fn drain_deadline_force_closes_slow_requests() {
    let started = Arc::new(Notify::new());
    let srv = start(
        app(Duration::from_millis(500), started.clone()),
        Duration::from_millis(50),
    )
    .await;

    let addr = srv.addr;
    let client = tokio::spawn(async move {
        let res = http_get(addr, "/slow").await;
        (res, Instant::now())
    });
    started.notified().await;

    let fired_at = Instant::now();
    srv.shutdown.trigger();

    let (res, closed_at) = client.await.unwrap();
    let text = res.unwrap_or_default();
    assert!(!text.contains("200 OK"), "request should have been cut off: {text}");

    let waited = closed_at.duration_since(fired_at);
    assert!(waited >= Duration::from_millis(50), "closed after {waited:?}");
    assert!(waited < Duration::from_millis(400), "closed after {waited:?}");

    srv.handle.await.unwrap().expect("drain timeout is not a failure");
    assert_eq!(*srv.state.borrow(), ServerState::Stopped);
}

#[tokio::test]
async fn repeated_shutdown_triggers_are_ignored() {
    let srv = start(app(Duration::ZERO, Arc::new(Notify::new())), Duration::from_secs(1)).await;

    assert!(srv.shutdown.trigger());
    assert!(!srv.shutdown.trigger());
    assert!(!srv.shutdown.clone().trigger());

    srv.handle.await.unwrap().expect("graceful stop");
    assert_eq!(*srv.state.borrow(), ServerState::Stopped);
}

#[tokio::test]
async fn served_requests_are_measured_by_route_template() {
    let t = support::test_app();
    let movie = t
        .state
        .movies()
        .insert(NewMovie {
            title: "Iron Man".into(),
            release_date: Utc::now(),
        })
        .await
        .unwrap();

    let srv = start(t.router.clone(), Duration::from_secs(1)).await;

    let res = http_get(srv.addr, &format!("/movies/{}", movie.id))
        .await
        .unwrap();
    assert!(res.starts_with("HTTP/1.1 200"), "got {res}");
    assert!(res.contains("Iron Man"));

    let samples = t.sink.histograms("goyagi.http.request");
    assert_eq!(samples.len(), 1, "{samples:?}");
    assert!(samples[0].has_tag("method:GET"));
    assert!(samples[0].has_tag("status_code:200"));
    assert!(samples[0].has_tag("path:/movies/:id"));

    srv.shutdown.trigger();
    srv.handle.await.unwrap().expect("graceful stop");
}
