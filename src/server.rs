//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`; no new connections are made.
//! 2. Asking every open connection to close gracefully. Idle keep-alive
//!    connections close at once; a connection mid-request finishes that
//!    request and then closes.
//! 3. Waiting for those connections, or until the optional
//!    [`shutdown_timeout`](Server::shutdown_timeout) elapses, after which the
//!    stragglers are aborted.
//! 4. Returning from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Set `terminationGracePeriodSeconds` in your pod spec longer than
//! `shutdown_timeout`, or longer than your slowest request if you leave it
//! unbounded.
//!
//! # Faults
//!
//! A panic inside middleware or a handler is contained to its request: the
//! client gets `500 Internal Server Error`, the panic is logged, and other
//! requests on the same process are unaffected.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::mux::Mux;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::router::Router;

const DEFAULT_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(30);

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use wisp::Server;
///
/// # fn main() -> Result<(), wisp::Error> {
/// let server = Server::bind("0.0.0.0:3000")?
///     .read_header_timeout(Duration::from_secs(5))
///     .shutdown_timeout(Duration::from_secs(25));
/// # let _ = server;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    bind: Bind,
    keep_alive: bool,
    read_header_timeout: Duration,
    shutdown_timeout: Option<Duration>,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| Error::InvalidAddress(addr.to_owned()))?;
        Ok(Self::with_bind(Bind::Addr(addr)))
    }

    /// Serves on an already-bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self::with_bind(Bind::Listener(listener))
    }

    fn with_bind(bind: Bind) -> Self {
        Self {
            bind,
            keep_alive: true,
            read_header_timeout: DEFAULT_READ_HEADER_TIMEOUT,
            shutdown_timeout: None,
        }
    }

    /// HTTP/1.1 keep-alive. On by default.
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// How long a client may take to send request headers. 30 s by default.
    pub fn read_header_timeout(mut self, timeout: Duration) -> Self {
        self.read_header_timeout = timeout;
        self
    }

    /// Upper bound on draining connections after the shutdown signal.
    /// Connections still open afterwards are aborted. Unbounded by default.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by in-flight connections completing).
    pub async fn serve<M: Mux>(self, router: Router<M>) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves.
    pub async fn serve_with_shutdown<M, F>(self, router: Router<M>, signal: F) -> Result<(), Error>
    where
        M: Mux,
        F: Future<Output = ()>,
    {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let local_addr = listener.local_addr()?;

        // Wrap the router in Arc so concurrent connection tasks share one
        // table. It is read-only from here on.
        let router = Arc::new(router);

        info!(addr = %local_addr, routes = router.routes().len(), "wisp listening");

        let mut conn_builder = ConnBuilder::new(TokioExecutor::new());
        conn_builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(Some(self.read_header_timeout))
            .keep_alive(self.keep_alive);

        // `graceful` tells every watched connection to wind down once the
        // signal fires; the JoinSet owns the tasks so they can be awaited or
        // aborted afterwards.
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        // The signal is polled on every loop iteration, so it must not move.
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting even when
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    // Called once per request on the connection, not once per
                    // connection.
                    let router = Arc::clone(&router);
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req, remote_addr).await }
                    });

                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to hyper's IO
                    // traits. The auto builder serves HTTP/1.1 or HTTP/2,
                    // whichever the client speaks.
                    let io = TokioIo::new(stream);
                    let conn = graceful.watch(conn_builder.serve_connection(io, svc).into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        let drain = async {
            graceful.shutdown().await;
            while tasks.join_next().await.is_some() {}
        };
        let drained = match self.shutdown_timeout {
            Some(limit) => tokio::time::timeout(limit, drain).await.is_ok(),
            None => {
                drain.await;
                true
            }
        };
        if !drained {
            warn!(aborted = tasks.len(), "shutdown timeout elapsed, aborting connections");
            tasks.shutdown().await;
        }

        info!("wisp stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, routes the request and converts the sink into a hyper
/// response. Every failure becomes a status code, so hyper never sees an error.
async fn dispatch<M: Mux>(
    router: Arc<Router<M>>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(ResponseWriter::with_status(StatusCode::BAD_REQUEST).into_response());
        }
    };

    let request = Request::from_parts(parts, body).with_remote_addr(remote_addr);
    let method = request.method().clone();
    let path = request.path().to_owned();

    let res = match AssertUnwindSafe(router.dispatch(request)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => {
            error!(%method, %path, peer = %remote_addr, panic = panic_message(&*panic), "handler panicked");
            ResponseWriter::with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(res.into_response())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available. A signal that cannot be installed is
/// logged and never fires.
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
            Ok(mut sig) => {
                sig.recv().await;
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
