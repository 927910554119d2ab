//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method};

/// The parsed request handed to API handlers.
///
/// The body has already been collected in full by the time a handler runs —
/// handlers never see a partial stream.
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub(crate) fn new(method: Method, path: String, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, path, headers, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request's URL path as received, e.g. `"/api/book"`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. Returns `None` for headers whose
    /// value is not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The raw request body. Parse it however you like — porch does not
    /// touch the bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, CONTENT_TYPE};

    fn request_with_header() -> Request {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Request::new(
            Method::POST,
            "/api/book".to_owned(),
            headers,
            Bytes::from_static(br#"{"title":"Dune"}"#),
        )
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request_with_header();
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn exposes_method_path_and_body() {
        let req = request_with_header();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/api/book");
        assert_eq!(req.body(), br#"{"title":"Dune"}"#);
    }
}
