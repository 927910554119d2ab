//! HTTP server: configuration, startup, and per-request dispatch.
//!
//! # Startup sequence
//!
//! [`Server::bind`] performs the one-time setup in a fixed order:
//!
//! 1. Ensure `<static_root>/404.html` exists (write the default page if
//!    absent). Failure aborts startup.
//! 2. Walk `<static_root>/api/**` and register one route per file the
//!    configured [`RouteLoader`] accepts, into the same table as
//!    programmatic registrations.
//! 3. Bind the listener.
//!
//! After that the route table is never mutated again — serving reads it
//! without any lock.
//!
//! # TLS
//!
//! The `protocol` knob accepts `"https"` for configuration compatibility,
//! but the listener is always plain TCP: TLS termination belongs to a
//! fronting proxy, not a development server. Any value other than `"https"`
//! silently resets to `"http"`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::globals::Globals;
use crate::handler::{ApiOutcome, BoxedHandler, Handler};
use crate::path;
use crate::request::Request;
use crate::routes::{self, RouteLoader, RouteTable};
use crate::static_files::{self, bytes_body, Body};

const BAD_REQUEST_BODY: &str = r#"{"error": "400 Bad Request"}"#;
const INTERNAL_ERROR_BODY: &str = r#"{"error": "500 Internal Server Error"}"#;

// ── Protocol ──────────────────────────────────────────────────────────────────

/// The configured URL scheme. Affects only how the server announces itself;
/// see the module docs for the TLS contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// Parses a scheme string. Anything other than `"https"` — including
    /// typos — silently resets to `Http`.
    pub fn parse(s: &str) -> Self {
        match s {
            "https" => Self::Https,
            _ => Self::Http,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

/// The development server, configured through the builder pattern.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use porch::{Globals, Request, Server};
///
/// #[tokio::main]
/// async fn main() {
///     Server::new()
///         .port(8080)
///         .static_path("./public")
///         .route("book", get_book)
///         .start()
///         .await
///         .expect("server error");
/// }
///
/// async fn get_book(_req: Request, _globals: Arc<Globals>) -> String {
///     r#"{"title":"Dune"}"#.to_owned()
/// }
/// ```
pub struct Server {
    port: u16,
    protocol: Protocol,
    static_path: PathBuf,
    dynamic_pages: bool,
    routes: RouteTable,
    globals: Arc<Globals>,
    loader: Option<Box<dyn RouteLoader>>,
}

impl Server {
    /// A server with the defaults: port 8080, `http`, static root `"./"`,
    /// page fallback enabled.
    pub fn new() -> Self {
        Self {
            port: 8080,
            protocol: Protocol::Http,
            static_path: PathBuf::from("./"),
            dynamic_pages: true,
            routes: RouteTable::new(),
            globals: Arc::new(Globals::new()),
            loader: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the URL scheme. Invalid values silently fall back to `"http"`.
    pub fn protocol(mut self, protocol: &str) -> Self {
        self.protocol = Protocol::parse(protocol);
        self
    }

    /// Root directory for static assets and for the `api` discovery folder.
    pub fn static_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_path = path.into();
        self
    }

    /// Toggles the single-page-app fallback: when enabled (the default),
    /// extensionless URL paths with no matching file serve the root
    /// `index.html` at 200 instead of the 404 page.
    pub fn dynamic_pages(mut self, enabled: bool) -> Self {
        self.dynamic_pages = enabled;
        self
    }

    /// Registers `handler` under `api/<normalized path>`. Registering the
    /// same path twice keeps only the second handler.
    pub fn route(mut self, route_path: &str, handler: impl Handler) -> Self {
        self.routes.register(route_path, handler.into_boxed_handler());
        self
    }

    /// Supplies the loader used by startup discovery to turn files under
    /// `<static_root>/api/**` into handlers. Without a loader, discovery is
    /// skipped and only programmatic routes exist.
    pub fn route_loader(mut self, loader: impl RouteLoader) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Sets the shared context passed to every handler invocation.
    pub fn globals(mut self, globals: Globals) -> Self {
        self.globals = Arc::new(globals);
        self
    }

    /// Runs the one-time setup (default 404 page, route discovery) and binds
    /// the listener. Setup failures abort startup.
    pub async fn bind(mut self) -> Result<BoundServer, Error> {
        static_files::ensure_not_found_page(&self.static_path).await?;

        if let Some(loader) = self.loader.take() {
            let api_dir = self.static_path.join("api");
            routes::discover(&mut self.routes, &api_dir, loader.as_ref()).await?;
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %listener.local_addr()?,
            scheme = self.protocol.scheme(),
            routes = self.routes.len(),
            static_root = %self.static_path.display(),
            "porch listening"
        );

        Ok(BoundServer {
            listener,
            shared: Arc::new(Shared {
                routes: self.routes,
                globals: self.globals,
                static_path: self.static_path,
                dynamic_pages: self.dynamic_pages,
            }),
        })
    }

    /// Binds and serves. Never returns while the server is live — only after
    /// a full graceful shutdown (SIGTERM or Ctrl-C, followed by all in-flight
    /// requests completing) or a startup failure.
    pub async fn start(self) -> Result<(), Error> {
        self.bind().await?.serve().await
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything dispatch needs, shared across connection tasks. Immutable once
/// serving begins.
struct Shared {
    routes: RouteTable,
    globals: Arc<Globals>,
    static_path: PathBuf,
    dynamic_pages: bool,
}

// ── BoundServer ───────────────────────────────────────────────────────────────

/// A server whose setup has completed and whose listener is bound, but which
/// is not yet accepting connections. Exposes the bound address so callers
/// (and tests) can bind port 0 and learn the real port.
pub struct BoundServer {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl BoundServer {
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections and dispatches them until shutdown.
    pub async fn serve(self) -> Result<(), Error> {
        let BoundServer { listener, shared } = self;

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Pin the shutdown future so we can poll it in a loop.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. We check shutdown first so a SIGTERM immediately
                // stops accepting new connections, even if more are queued.
                biased;

                () = &mut shutdown => {
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

                    let shared = Arc::clone(&shared);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the
                    // hyper IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // `service_fn` turns a plain async function into a
                        // hyper `Service`. The closure is called once per
                        // request on the connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let shared = Arc::clone(&shared);
                            async move { dispatch(shared, req).await }
                        });

                        // `auto::Builder` transparently handles both HTTP/1.1
                        // and HTTP/2 — whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection to finish before we return.
        while tasks.join_next().await.is_some() {}

        info!("porch stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: decides for one request whether a registered handler
/// services it or a file on disk does, and produces the response.
///
/// The error type is [`Infallible`] — all failures become responses (400,
/// 404, 500) so hyper never sees an error.
async fn dispatch(
    shared: Arc<Shared>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Body>, Infallible> {
    let normalized = path::normalize(req.uri().path());

    if let Some(handler) = shared.routes.lookup(&normalized) {
        return Ok(dispatch_api(&shared, handler, req).await);
    }

    let url_path = req.uri().path().to_owned();
    Ok(static_files::serve(&shared.static_path, &url_path, shared.dynamic_pages).await)
}

/// API branch: collect the body, run the handler to completion, then write
/// the outcome. No bytes reach the wire before the handler finishes.
async fn dispatch_api(
    shared: &Shared,
    handler: BoxedHandler,
    req: hyper::Request<Incoming>,
) -> http::Response<Body> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = %parts.uri.path(), "failed to read request body: {e}");
            return json_response(StatusCode::BAD_REQUEST, BAD_REQUEST_BODY.to_owned());
        }
    };

    let request = Request::new(parts.method, parts.uri.path().to_owned(), parts.headers, body);
    let globals = Arc::clone(&shared.globals);

    // The handler future runs in its own task: a panic surfaces here as a
    // JoinError instead of tearing down the connection dispatch, so one
    // request's fault never takes the listener with it.
    let outcome = tokio::spawn(async move { handler.call(request, globals).await }).await;

    match outcome {
        Ok(ApiOutcome::Body(body)) => json_response(StatusCode::OK, body),
        Ok(ApiOutcome::Reject) => json_response(StatusCode::BAD_REQUEST, BAD_REQUEST_BODY.to_owned()),
        Err(e) => {
            error!("handler crashed: {e}");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.to_owned())
        }
    }
}

fn json_response(status: StatusCode, body: String) -> http::Response<Body> {
    let mut response = http::Response::new(bytes_body(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C, for
/// local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` is a future that never resolves — on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_protocol_falls_back_to_http() {
        assert_eq!(Protocol::parse("http"), Protocol::Http);
        assert_eq!(Protocol::parse("https"), Protocol::Https);
        assert_eq!(Protocol::parse("HTTPS"), Protocol::Http);
        assert_eq!(Protocol::parse("spdy"), Protocol::Http);
        assert_eq!(Protocol::parse(""), Protocol::Http);
    }
}
