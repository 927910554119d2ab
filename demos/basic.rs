//! Minimal porch example — a static SPA root plus two API routes.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/api/book
//!   curl http://localhost:8080/api/hits
//!   curl http://localhost:8080/missing.png       # 404 page
//!   curl http://localhost:8080/pages/anything    # index.html fallback

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use porch::{Globals, Request, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    Server::new()
        .port(8080)
        .static_path("./public")
        .globals(Globals::new().set("hits", AtomicUsize::new(0)))
        .route("book", get_book)
        .route("hits", count_hits)
        .start()
        .await
        .expect("server error");
}

// GET /api/book
//
// The returned string is the response body, verbatim. Expected to be JSON
// by convention — porch does not check.
async fn get_book(_req: Request, _globals: Arc<Globals>) -> String {
    r#"{"title":"Dune","author":"Frank Herbert"}"#.to_owned()
}

// GET /api/hits
//
// Shared state lives in Globals; synchronization of concurrent mutation is
// yours, hence the atomic.
async fn count_hits(_req: Request, globals: Arc<Globals>) -> Option<String> {
    let hits = globals.get::<AtomicUsize>("hits")?;
    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
    Some(format!(r#"{{"hits":{n}}}"#))
}
