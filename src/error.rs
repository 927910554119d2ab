//! Unified error type.

use std::fmt;

/// The error type returned by porch's fallible operations.
///
/// Request-level outcomes (400, 404, 500) are expressed as HTTP responses,
/// not as `Error`s. This type surfaces infrastructure failures: binding the
/// listener, walking the handler directory, or writing the default `404.html`
/// at startup — all of which abort startup, since the server cannot
/// guarantee a consistent serving state without them.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
