//! Error types for the HTTP helpers.
//!
//! # Design
//! A single `NetError` enum covers every failure a helper can report. The
//! variants are fine-grained (a malformed URL and a malformed query string
//! are different variants) while `ErrorKind` groups them into the coarse
//! categories callers usually branch on: parse, transport, HTTP status,
//! decode, filesystem, and request construction.

use std::io;
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors returned by the request helpers and URL utilities.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// The base URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The query string contains a malformed escape or separator.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The request could not be constructed (bad URI, bad header name or value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, DNS, TLS, or timeout failure while talking to the server.
    #[error("transport error: {0}")]
    Transport(#[source] ureq::Error),

    /// The server answered with a status outside `[200, 300)`.
    #[error("HTTP error: {status}")]
    HttpStatus { code: u16, status: String },

    /// The response body is not valid JSON for the requested type.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A local file could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying file contents into a multipart body failed.
    #[error("multipart encoding failed: {0}")]
    Multipart(#[source] io::Error),
}

/// Coarse category of a `NetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Transport,
    HttpStatus,
    Decode,
    Filesystem,
    Request,
}

impl NetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::InvalidUrl(_) | NetError::InvalidQuery(_) => ErrorKind::Parse,
            NetError::Transport(_) => ErrorKind::Transport,
            NetError::HttpStatus { .. } => ErrorKind::HttpStatus,
            NetError::Decode(_) => ErrorKind::Decode,
            NetError::Filesystem { .. } => ErrorKind::Filesystem,
            NetError::InvalidRequest(_) | NetError::Encode(_) | NetError::Multipart(_) => {
                ErrorKind::Request
            }
        }
    }

    /// Status code carried by an `HttpStatus` error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the transport gave up because a timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Transport(ureq::Error::Timeout(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_uses_status_text() {
        let err = NetError::HttpStatus {
            code: 404,
            status: "404 Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: 404 Not Found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
    }

    #[test]
    fn url_parse_errors_are_parse_kind() {
        let err: NetError = url::Url::parse("://nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn filesystem_display_names_the_path() {
        let err = NetError::Filesystem {
            path: PathBuf::from("/tmp/missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("cannot open /tmp/missing.txt"));
        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert!(!err.is_timeout());
    }
}
