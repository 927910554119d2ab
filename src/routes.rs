//! Route table and startup route discovery.
//!
//! A route is a normalized path string mapped to exactly one handler, always
//! implicitly namespaced under `api/`. The table is populated from two
//! sources before serving starts — programmatic [`Server::route`](crate::Server::route)
//! calls and files discovered under
//! `<static_root>/api/**` — and is read-only afterwards, which is what makes
//! concurrent lookups inherently safe without a lock.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::handler::{BoxedHandler, DynHandler};
use crate::path;

// ── Route table ───────────────────────────────────────────────────────────────

/// Exact-match map from normalized `api/…` path to handler.
pub(crate) struct RouteTable {
    entries: HashMap<String, BoxedHandler>,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Registers `handler` under `api/<normalized raw>`. Re-registration
    /// overwrites silently — last write wins.
    pub(crate) fn register(&mut self, raw: &str, handler: BoxedHandler) {
        let key = path::join("api", raw);
        self.entries.insert(key, handler);
    }

    /// Looks up a handler by the already-normalized URL path. The returned
    /// Arc clone is the table's only per-request cost.
    pub(crate) fn lookup(&self, normalized: &str) -> Option<BoxedHandler> {
        self.entries.get(normalized).map(std::sync::Arc::clone)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// ── File-based discovery ──────────────────────────────────────────────────────

/// Turns a discovered handler file into a handler.
///
/// porch walks `<static_root>/api/**` at startup and asks the loader for a
/// handler per file; how a file becomes executable code (a scripting engine,
/// a template, a lookup into statically-linked functions) is the caller's
/// business. Return `None` to skip a file that is not a handler.
///
/// Discovered routes land in the same table as programmatic registrations:
/// a file `api/v1/users.hbs` registers the route `api/v1/users` — its path
/// relative to the `api` directory, extension stripped.
pub trait RouteLoader: Send + Sync + 'static {
    fn load(&self, file: &Path) -> Option<DynHandler>;
}

impl<F> RouteLoader for F
where
    F: Fn(&Path) -> Option<DynHandler> + Send + Sync + 'static,
{
    fn load(&self, file: &Path) -> Option<DynHandler> {
        self(file)
    }
}

/// Walks `api_dir` depth-first and registers one route per file the loader
/// accepts. A missing `api` directory is not an error — there is simply
/// nothing to discover. Any other I/O failure aborts startup.
pub(crate) async fn discover(
    table: &mut RouteTable,
    api_dir: &Path,
    loader: &dyn RouteLoader,
) -> io::Result<()> {
    match fs::metadata(api_dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    }

    let mut pending: Vec<PathBuf> = vec![api_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(entry_path);
                continue;
            }
            let Ok(relative) = entry_path.strip_prefix(api_dir) else {
                continue;
            };
            let route = relative.with_extension("");
            let route = route.to_string_lossy();
            match loader.load(&entry_path) {
                Some(handler) => {
                    table.register(route.as_ref(), handler.0);
                    info!(file = %entry_path.display(), route = %path::join("api", route.as_ref()), "registered file route");
                }
                None => {
                    debug!(file = %entry_path.display(), "loader declined file, skipping");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals::Globals;
    use crate::handler::{ApiOutcome, Handler};
    use crate::request::Request;
    use std::sync::Arc;

    fn handler_returning(body: &'static str) -> BoxedHandler {
        let f = move |_req: Request, _g: Arc<Globals>| async move { body };
        f.into_boxed_handler()
    }

    async fn call(table: &RouteTable, key: &str) -> Option<String> {
        let handler = table.lookup(key)?;
        let req = Request::new(
            http::Method::GET,
            format!("/{key}"),
            http::HeaderMap::new(),
            bytes::Bytes::new(),
        );
        match handler.call(req, Arc::new(Globals::new())).await {
            ApiOutcome::Body(b) => Some(b),
            ApiOutcome::Reject => None,
        }
    }

    #[tokio::test]
    async fn registration_normalizes_the_key() {
        let mut table = RouteTable::new();
        table.register("/book/", handler_returning("a"));
        assert!(table.lookup("api/book").is_some());
        assert!(table.lookup("api/book/").is_none()); // lookups take normalized paths
        assert!(table.lookup("book").is_none());
    }

    #[tokio::test]
    async fn re_registration_is_last_write_wins() {
        let mut table = RouteTable::new();
        table.register("book", handler_returning("first"));
        table.register("/book", handler_returning("second"));
        assert_eq!(table.len(), 1);
        assert_eq!(call(&table, "api/book").await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn discovery_registers_nested_files_and_skips_declined() {
        let root = tempfile::tempdir().unwrap();
        let api_dir = root.path().join("api");
        std::fs::create_dir_all(api_dir.join("v1")).unwrap();
        std::fs::write(api_dir.join("hello.txt"), "hello body").unwrap();
        std::fs::write(api_dir.join("v1/users.txt"), "users body").unwrap();
        std::fs::write(api_dir.join("notes.skip"), "not a handler").unwrap();

        let loader = |file: &Path| -> Option<DynHandler> {
            if file.extension()? != "txt" {
                return None;
            }
            let body = std::fs::read_to_string(file).ok()?;
            Some(DynHandler::new(move |_req: Request, _g: Arc<Globals>| {
                let body = body.clone();
                async move { body }
            }))
        };

        let mut table = RouteTable::new();
        discover(&mut table, &api_dir, &loader).await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(call(&table, "api/hello").await.as_deref(), Some("hello body"));
        assert_eq!(call(&table, "api/v1/users").await.as_deref(), Some("users body"));
        assert!(table.lookup("api/notes").is_none());
    }

    #[tokio::test]
    async fn discovery_with_missing_api_dir_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        let loader = |_file: &Path| -> Option<DynHandler> { None };
        let mut table = RouteTable::new();
        discover(&mut table, &root.path().join("api"), &loader).await.unwrap();
        assert_eq!(table.len(), 0);
    }
}
