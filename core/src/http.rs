//! HTTP request and response values as plain data.
//!
//! # Design
//! The helpers build `HttpRequest` values and parse `HttpResponse` values
//! without touching the network; only `HttpClient` performs I/O. Keeping the
//! two apart lets the build/parse half be tested without a server.
//!
//! All fields use owned types (`String`, `Vec`) so values can be moved
//! between the pure layer and the transport without lifetime concerns.

use std::collections::HashMap;
use std::fmt;

/// Caller-supplied header set, copied into the outgoing request.
pub type Headers = HashMap<String, String>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing header with the same name.
    /// Names compare case-insensitively.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(slot) => {
                slot.0 = name.to_string();
                slot.1 = value.to_string();
            }
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Overlay every header of `headers`; later values win over earlier ones.
    pub fn apply_headers(&mut self, headers: Option<&Headers>) {
        if let Some(headers) = headers {
            for (name, value) in headers {
                self.set_header(name, value);
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body has been read completely; the connection it came from has
/// already been released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Status line without the protocol, e.g. `"404 Not Found"`.
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        is_success_status_code(self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A status code is successful iff it lies in `[200, 300)`.
pub fn is_success_status_code(code: u16) -> bool {
    (200..300).contains(&code)
}

/// Render `"<code> <reason>"`, or just the code when the reason is unknown.
pub fn status_text(code: u16) -> String {
    let reason = ureq::http::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());
    match reason {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}
