//! Blocking HTTP helpers with JSON marshaling.
//!
//! # Overview
//! Convenience functions for the common HTTP round trips: JSON verbs
//! (`get_json`, `post_json`, `put_json`, `delete_json`), file download and
//! multipart upload, plus URL composition and query-string parsing.
//!
//! # Design
//! - `client` builds `HttpRequest` values and parses `HttpResponse` values
//!   without touching the network, so defaults and error precedence are
//!   testable in isolation.
//! - `transport::HttpClient` is the only place that performs I/O. It reads
//!   each response body to the end before returning.
//! - `helpers` composes the two with a fresh client per call; callers that
//!   want connection reuse build one with `create_http_client` and call the
//!   same operations as methods.
//! - Nothing is retried and nothing is cached.

pub mod client;
pub mod error;
pub mod helpers;
pub mod http;
pub mod multipart;
pub mod query;
pub mod transport;

pub use error::{ErrorKind, NetError, Result};
pub use helpers::{
    delete, delete_json, download_file, get, get_json, post_json, put_json, upload_file,
};
pub use http::{is_success_status_code, Headers, HttpMethod, HttpRequest, HttpResponse};
pub use multipart::MultipartForm;
pub use query::{build_url, parse_query_params};
pub use transport::{create_http_client, ClientConfig, HttpClient, DEFAULT_TIMEOUT, UPLOAD_TIMEOUT};
