//! Static-file resolution and streaming.
//!
//! Every request that misses the route table lands here. Resolution decides
//! *which* file answers the request and with *what* status; streaming then
//! sends that file's bytes incrementally — the whole file is never buffered
//! in memory.
//!
//! # Resolution rules
//!
//! 1. A URL ending in a separator asks for `<path>/index.html` (directory
//!    convention).
//! 2. Anything else asks for the file verbatim.
//! 3. If the candidate exists as a regular file, serve it with 200.
//! 4. If it doesn't and the URL's final segment carries no extension, the
//!    request is treated as a front-end page route and answered with the
//!    root `index.html` at 200 — the single-page-app fallback. This is a
//!    convention-based guess: nothing proves such a route exists in the
//!    front-end, and the `dynamic_pages` toggle turns the guess off.
//! 5. Everything else is a plain miss: `404.html` at 404. A minimal default
//!    page is written at startup if the static root doesn't provide one.
//!
//! Probe failures other than NotFound (permissions, dangling symlinks) are
//! logged and conflated with NotFound — the client cannot tell them apart.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::{mime, path};

/// The page served for misses when the static root has no `404.html`.
/// Written to `<static_root>/404.html` once at startup.
pub(crate) const DEFAULT_NOT_FOUND_PAGE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><title>404 Not Found</title></head>\n\
<body>\n\
<h1>404 Not Found</h1>\n\
<p>The requested resource could not be found on this server.</p>\n\
</body>\n\
</html>\n";

// ── Response bodies ───────────────────────────────────────────────────────────

/// The single body type both dispatch branches produce: buffered for API
/// responses, streamed for files.
pub(crate) type Body = BoxBody<Bytes, io::Error>;

pub(crate) fn bytes_body(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

/// Streams `file` chunk by chunk. The handle is owned by the body and closed
/// when the response completes or the connection is torn down.
fn file_body(file: File) -> Body {
    StreamBody::new(ReaderStream::new(file).map_ok(Frame::data)).boxed()
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Outcome of static resolution: the file to stream and the status to send.
pub(crate) struct Resolved {
    pub(crate) path: PathBuf,
    pub(crate) status: StatusCode,
}

/// Decides which file on disk answers `url_path`, per the module rules.
pub(crate) async fn resolve(url_path: &str, root: &Path, dynamic_pages: bool) -> Resolved {
    let normalized = path::normalize(url_path);
    let candidate = if url_path.ends_with('/') || url_path.ends_with('\\') {
        root.join(&normalized).join("index.html")
    } else {
        root.join(&normalized)
    };

    if probe(&candidate).await {
        return Resolved { path: candidate, status: StatusCode::OK };
    }

    if dynamic_pages && !has_extension(&normalized) {
        debug!(url = url_path, "no matching file, serving page fallback");
        return Resolved { path: root.join("index.html"), status: StatusCode::OK };
    }

    warn!(url = url_path, candidate = %candidate.display(), "static asset not found");
    Resolved { path: root.join("404.html"), status: StatusCode::NOT_FOUND }
}

/// True if the candidate exists and is a regular file. Errors other than
/// NotFound are logged and answered as a miss — no distinction reaches the
/// client.
async fn probe(candidate: &Path) -> bool {
    match fs::metadata(candidate).await {
        Ok(meta) => meta.is_file(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %candidate.display(), "static probe failed: {e}");
            false
        }
    }
}

/// Whether the final segment of a normalized URL path carries a file
/// extension. `"pages/cities/tokyo"` → no, `"img/logo.svg"` → yes.
fn has_extension(normalized: &str) -> bool {
    let last = normalized.rsplit('/').next().unwrap_or("");
    Path::new(last).extension().is_some()
}

// ── Serving ───────────────────────────────────────────────────────────────────

/// Resolves and streams the response for a non-API request.
pub(crate) async fn serve(root: &Path, url_path: &str, dynamic_pages: bool) -> http::Response<Body> {
    let resolved = resolve(url_path, root, dynamic_pages).await;
    if let Some(response) = open_response(&resolved.path, resolved.status).await {
        return response;
    }

    // The resolved file disappeared or is unreadable between probe and open
    // (or index.html simply doesn't exist). Substitute the 404 page.
    let not_found_page = root.join("404.html");
    if resolved.path != not_found_page {
        if let Some(response) = open_response(&not_found_page, StatusCode::NOT_FOUND).await {
            return response;
        }
    }

    let mut response = http::Response::new(bytes_body(Bytes::new()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response
}

/// Opens `file_path` and builds a streaming response with `status`, a
/// `Content-type` derived from the resolved path's extension, and a
/// `Content-length` when the file size is known.
async fn open_response(file_path: &Path, status: StatusCode) -> Option<http::Response<Body>> {
    let file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %file_path.display(), "failed to open static file: {e}");
            return None;
        }
    };
    let len = file.metadata().await.ok().map(|m| m.len());
    let content_type = mime::content_type(file_path.extension().and_then(|e| e.to_str()));

    let mut response = http::Response::new(file_body(file));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Some(len) = len {
        response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    Some(response)
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Guarantees `<root>/404.html` exists before serving starts, writing the
/// default page if the static root doesn't provide one. I/O failures here
/// are fatal to startup.
pub(crate) async fn ensure_not_found_page(root: &Path) -> io::Result<()> {
    let page = root.join("404.html");
    match fs::metadata(&page).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::write(&page, DEFAULT_NOT_FOUND_PAGE).await?;
            info!(path = %page.display(), "wrote default 404 page");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), "<h1>app</h1>").unwrap();
        std::fs::write(root.path().join("404.html"), "<h1>gone</h1>").unwrap();
        std::fs::create_dir_all(root.path().join("a/b")).unwrap();
        std::fs::write(root.path().join("a/b/index.html"), "<h1>b</h1>").unwrap();
        std::fs::write(root.path().join("a/b/c.svg"), "<svg/>").unwrap();
        root
    }

    #[tokio::test]
    async fn existing_file_resolves_verbatim() {
        let root = static_root();
        let r = resolve("/a/b/c.svg", root.path(), true).await;
        assert_eq!(r.status, StatusCode::OK);
        assert_eq!(r.path, root.path().join("a/b/c.svg"));
    }

    #[tokio::test]
    async fn trailing_separator_resolves_to_directory_index() {
        let root = static_root();
        let r = resolve("/a/b/", root.path(), true).await;
        assert_eq!(r.status, StatusCode::OK);
        assert_eq!(r.path, root.path().join("a/b").join("index.html"));
    }

    #[tokio::test]
    async fn missing_asset_with_extension_resolves_to_404_page() {
        let root = static_root();
        let r = resolve("/img/logo.png", root.path(), true).await;
        assert_eq!(r.status, StatusCode::NOT_FOUND);
        assert_eq!(r.path, root.path().join("404.html"));
    }

    #[tokio::test]
    async fn missing_extensionless_path_falls_back_to_index() {
        let root = static_root();
        let r = resolve("/pages/cities/tokyo", root.path(), true).await;
        assert_eq!(r.status, StatusCode::OK);
        assert_eq!(r.path, root.path().join("index.html"));
    }

    #[tokio::test]
    async fn page_fallback_can_be_disabled() {
        let root = static_root();
        let r = resolve("/pages/cities/tokyo", root.path(), false).await;
        assert_eq!(r.status, StatusCode::NOT_FOUND);
        assert_eq!(r.path, root.path().join("404.html"));
    }

    #[tokio::test]
    async fn missing_directory_route_is_page_like() {
        let root = static_root();
        let r = resolve("/nope/", root.path(), true).await;
        assert_eq!(r.status, StatusCode::OK);
        assert_eq!(r.path, root.path().join("index.html"));
    }

    #[tokio::test]
    async fn traversal_stays_inside_the_root() {
        let root = static_root();
        let r = resolve("/../../etc/passwd", root.path(), false).await;
        assert_eq!(r.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ensure_writes_default_page_once() {
        let root = tempfile::tempdir().unwrap();
        ensure_not_found_page(root.path()).await.unwrap();
        let written = std::fs::read_to_string(root.path().join("404.html")).unwrap();
        assert_eq!(written, DEFAULT_NOT_FOUND_PAGE);

        // An existing page is left untouched.
        std::fs::write(root.path().join("404.html"), "custom").unwrap();
        ensure_not_found_page(root.path()).await.unwrap();
        let kept = std::fs::read_to_string(root.path().join("404.html")).unwrap();
        assert_eq!(kept, "custom");
    }
}
