//! Route and URL path canonicalization.
//!
//! Every path that enters the crate — route registrations, incoming URL
//! pathnames, discovered handler files — is reduced to the same canonical
//! form before it is compared to anything: forward slashes only, no `.` or
//! `..` segments, no leading or trailing separator. `"/api/book/"` and
//! `"api\\book"` both normalize to `"api/book"`, so a route registered one
//! way matches a request spelled the other way.
//!
//! `..` segments are resolved against a segment stack and cannot pop past
//! the root, which also contains directory-traversal attempts before a URL
//! path ever touches the filesystem.

/// Canonicalizes a path: collapses separator variants, resolves `.`/`..`
/// segments, and strips leading/trailing separators.
///
/// Idempotent: `normalize(normalize(p)) == normalize(p)`.
pub(crate) fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Joins two path fragments and normalizes the result.
pub(crate) fn join(base: &str, rest: &str) -> String {
    normalize(&format!("{base}/{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(normalize("/api/book/"), "api/book");
        assert_eq!(normalize("api/book"), "api/book");
        assert_eq!(normalize("//api//book//"), "api/book");
    }

    #[test]
    fn collapses_separator_variants() {
        assert_eq!(normalize("api\\book"), "api/book");
        assert_eq!(normalize("api\\v1/users"), "api/v1/users");
    }

    #[test]
    fn resolves_relative_segments() {
        assert_eq!(normalize("a/./b"), "a/b");
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize("../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn empty_and_root_paths() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("/./"), "");
    }

    #[test]
    fn is_idempotent() {
        for p in ["/api/book/", "a/b/../c", "\\x\\y\\", "", "/pages/cities/tokyo"] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn join_normalizes_the_result() {
        assert_eq!(join("api", "book"), "api/book");
        assert_eq!(join("api", "/book/"), "api/book");
        assert_eq!(join("api", "v1//users"), "api/v1/users");
    }
}
