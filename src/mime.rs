//! File-extension to content-type mapping.
//!
//! This is the entirety of porch's content negotiation: a fixed table keyed
//! by lower-cased extension, falling back to `application/octet-stream`.
//! Total function — there is no error case.

/// Returns the content-type for a file extension (without the dot).
///
/// Case-insensitive; unknown or absent extensions map to
/// `application/octet-stream`.
pub(crate) fn content_type(extension: Option<&str>) -> &'static str {
    let lower = extension.map(str::to_ascii_lowercase);
    match lower.as_deref() {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",

        // Media and documents
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",

        // Default
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_types() {
        assert_eq!(content_type(Some("html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Some("css")), "text/css; charset=utf-8");
        assert_eq!(content_type(Some("js")), "text/javascript; charset=utf-8");
        assert_eq!(content_type(Some("json")), "application/json");
        assert_eq!(content_type(Some("svg")), "image/svg+xml");
        assert_eq!(content_type(Some("png")), "image/png");
    }

    #[test]
    fn lower_cases_before_lookup() {
        assert_eq!(content_type(Some("HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Some("SvG")), "image/svg+xml");
    }

    #[test]
    fn unknown_extension_falls_back() {
        assert_eq!(content_type(Some("xyz")), "application/octet-stream");
        assert_eq!(content_type(None), "application/octet-stream");
    }
}
