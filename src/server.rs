//! HTTP server and graceful shutdown.
//!
//! # Request admission
//!
//! Every request passes through, in order:
//! 1. The [`RateLimiter`], if one was configured: no token means `429`.
//! 2. The [`Router`]: a matching route runs its handler. A path registered
//!    only for other methods gets `405` with an `allow` header. An unknown
//!    path gets `404`.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C (or the caller's own future, see
//! [`Server::serve_with_shutdown`]) the server:
//! 1. Stops `listener.accept()`: no new connections are made.
//! 2. Tells every open connection to finish its in-flight request and close.
//! 3. Waits for those connections up to the grace period, then aborts the
//!    stragglers.
//! 4. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! # Listener failures
//!
//! Accept errors that concern a single connection or a temporary resource
//! shortage (`ECONNABORTED`, `EMFILE`, `ENFILE`, ...) are logged and retried
//! after an exponential backoff. Any other accept error drains the open
//! connections like a shutdown and is returned from `serve`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::method::Method;
use crate::middleware::RateLimiter;
use crate::request::Request;
use crate::response::{ErrorBody, Response};
use crate::router::Router;
use crate::status::Status;

/// Default time in-flight connections get to finish after a shutdown signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Bounds for the pause after a transient accept error.
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// The HTTP server.
pub struct Server {
    bind: Bind,
    limiter: Option<RateLimiter>,
    grace_period: Duration,
}

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// State shared by every connection task.
struct Shared {
    router: Router,
    limiter: Option<RateLimiter>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use partsbin::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 8080).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self::with(Bind::Addr(addr))
    }

    /// Serves on an already-bound listener, e.g. one bound to port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self::with(Bind::Listener(listener))
    }

    fn with(bind: Bind) -> Self {
        Self { bind, limiter: None, grace_period: DEFAULT_GRACE_PERIOD }
    }

    /// Rejects requests with `429` once `limiter` runs dry.
    pub fn rate_limit(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by in-flight requests completing or the grace period
    /// running out), or with the listener's error if accepting fails for
    /// good.
    pub async fn serve(self, router: Router) -> Result<()> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves
    /// instead of on process signals.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        let shared = Arc::new(Shared { router, limiter: self.limiter });

        info!(%addr, "partsbin listening");

        let mut tasks = JoinSet::new();
        // Flipped once on shutdown; every connection task watches it.
        let (drain_tx, drain_rx) = watch::channel(());

        tokio::pin!(signal);

        let mut backoff = ACCEPT_BACKOFF_MIN;
        let mut failure = None;

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => {
                            backoff = ACCEPT_BACKOFF_MIN;
                            v
                        }
                        Err(e) if is_transient(&e) => {
                            warn!(retry_in_ms = backoff.as_millis() as u64, "accept error: {e}");
                            tokio::select! {
                                biased;
                                () = &mut signal => {
                                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                                    break;
                                }
                                () = tokio::time::sleep(backoff) => {}
                            }
                            backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                            continue;
                        }
                        Err(e) => {
                            error!(in_flight = tasks.len(), "listener failed, draining connections: {e}");
                            failure = Some(e);
                            break;
                        }
                    };

                    let shared = Arc::clone(&shared);
                    let mut draining = drain_rx.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let shared = Arc::clone(&shared);
                            async move { dispatch(shared, req, remote_addr).await }
                        });

                        let builder = ConnBuilder::new(TokioExecutor::new());
                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = draining.changed() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        let _ = drain_tx.send(());
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(self.grace_period, drain).await.is_err() {
            warn!(remaining = tasks.len(), "grace period elapsed, aborting connections");
            tasks.abort_all();
        }

        match failure {
            Some(e) => Err(e.into()),
            None => {
                info!("partsbin stopped");
                Ok(())
            }
        }
    }
}

/// Whether an accept error leaves the listener usable.
///
/// Aborted or reset handshakes concern one peer only. Descriptor and buffer
/// exhaustion clear up as connections close, so the loop waits them out.
fn is_transient(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    if matches!(
        e.kind(),
        ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionRefused
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    ) {
        return true;
    }
    e.raw_os_error().is_some_and(is_resource_exhaustion)
}

#[cfg(unix)]
fn is_resource_exhaustion(code: i32) -> bool {
    matches!(code, libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_code: i32) -> bool {
    false
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Handles one request end to end. Every failure becomes a response, so
/// hyper never sees an error.
async fn dispatch(
    shared: Arc<Shared>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> std::result::Result<http::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();

    let response = respond(&shared, &parts, remote_addr).await;

    info!(
        method = %parts.method,
        path = parts.uri.path(),
        status = u16::from(response.status),
        latency_ms = started.elapsed().as_secs_f64() * 1e3,
        "request"
    );
    Ok(response.into_inner())
}

async fn respond(shared: &Shared, parts: &http::request::Parts, remote_addr: SocketAddr) -> Response {
    if let Some(limiter) = &shared.limiter {
        if !limiter.try_acquire() {
            warn!(peer = %remote_addr, "rate limit exceeded");
            return ErrorBody::respond("Too many requests", Status::TooManyRequests);
        }
    }

    let path = parts.uri.path();
    let route = Method::try_from(&parts.method)
        .ok()
        .and_then(|method| shared.router.lookup(method, path));

    if let Some(handler) = route {
        return handler.call(Request::new(parts)).await;
    }

    let allowed = shared.router.allowed(path);
    if allowed.is_empty() {
        return Response::status(Status::NotFound);
    }
    let allow: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
    Response::builder()
        .status(Status::MethodNotAllowed)
        .header("allow", &allow.join(", "))
        .no_body()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available. A handler that cannot be installed is logged and never
/// fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
