//! # porch
//!
//! A tiny development HTTP server: static files plus drop-in API routes.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! porch exists for one workflow: you are building a single-page app and
//! want its assets served from a directory while you sketch ad-hoc API
//! endpoints next to them. Production concerns stay out — there is no
//! middleware stack, no content negotiation beyond extension-to-MIME
//! mapping, no Range requests, no compression, no caching headers, and TLS
//! termination belongs to whatever fronts you in deployment.
//!
//! What porch does do, for every request:
//!
//! - **Route dispatch** — normalized exact-match lookup under the `api/`
//!   prefix; registered handlers run to completion before a byte is written
//! - **Static resolution** — directory `index.html` convention, extension
//!   to content-type mapping, and streaming file bodies
//! - **SPA fallback** — extensionless paths with no matching file serve the
//!   root `index.html`, so front-end routes survive a page reload; missing
//!   assets with an extension get the `404.html` page instead
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use porch::{Globals, Request, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::new()
//!         .port(8080)
//!         .static_path("./public")
//!         .globals(Globals::new().set("motd", String::from("hi")))
//!         .route("book", get_book)
//!         .start()
//!         .await
//!         .expect("server error");
//! }
//!
//! async fn get_book(_req: Request, globals: Arc<Globals>) -> Option<String> {
//!     let motd = globals.get::<String>("motd")?;
//!     Some(format!(r#"{{"title":"Dune","motd":"{motd}"}}"#))
//! }
//! ```
//!
//! A handler returning `None` (or an empty string) rejects the request:
//! the client gets `400` with body `{"error": "400 Bad Request"}`.
//!
//! ## File-based routes
//!
//! Files under `<static_path>/api/**` become routes at startup: each file
//! registers under its path relative to the `api` directory with the
//! extension stripped (`api/v1/users.hbs` → `GET /api/v1/users`). porch
//! walks the tree; *you* say what a file means by supplying a
//! [`RouteLoader`] that turns a file into a handler. File routes and
//! programmatic routes land in the same table — last registration wins.

mod error;
mod globals;
mod handler;
mod mime;
mod path;
mod request;
mod routes;
mod server;
mod static_files;

pub use error::Error;
pub use globals::Globals;
pub use handler::{ApiOutcome, DynHandler, Handler, IntoApiOutcome};
pub use request::Request;
pub use routes::RouteLoader;
pub use server::{BoundServer, Protocol, Server};
