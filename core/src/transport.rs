//! Blocking transport that executes `HttpRequest` values with `ureq`.
//!
//! # Design
//! `HttpClient` wraps a `ureq::Agent` together with the `ClientConfig` it was
//! built from. Agents hold no per-call state, so a client can be cloned and
//! shared across threads; each clone reuses the same connection pool.
//!
//! Status codes are never treated as transport errors here. The response
//! body is read to the end and the underlying stream is dropped before
//! `execute` returns, on success and on every error path.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ureq::http;

use crate::client::{
    build_delete_json, build_get_json, build_plain, build_post_json, build_put_json,
    build_upload, parse_download, parse_json_response,
};
use crate::error::{NetError, Result};
use crate::http::{status_text, Headers, HttpMethod, HttpRequest, HttpResponse};

/// Timeout for JSON verbs and plain GET/DELETE.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for multipart uploads.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an `HttpClient`.
///
/// Values are passed to the transport without validation. A zero `timeout`
/// means no timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "timeout_ms", with = "duration_millis")]
    pub timeout: Duration,
    pub max_idle_connections: usize,
    pub max_idle_connections_per_host: usize,
    /// Recorded on the configuration only; the blocking transport has no
    /// per-host connection cap.
    pub max_connections_per_host: usize,
}

impl ClientConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_idle_connections: 10,
            max_idle_connections_per_host: 3,
            max_connections_per_host: 0,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Reusable blocking HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global((!config.timeout.is_zero()).then_some(config.timeout))
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .build()
            .new_agent();
        Self { agent, config }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(ClientConfig::with_timeout(timeout))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request` and return the fully-read response.
    ///
    /// Any status code is a successful round trip; classifying it is left to
    /// the caller.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        tracing::debug!(
            %method,
            %url,
            body_bytes = body.as_ref().map_or(0, Vec::len),
            "sending request"
        );

        let result = match body {
            Some(body) => self.agent.run(to_http(method, &url, &headers, body)?),
            None => self.agent.run(to_http(method, &url, &headers, ())?),
        };
        let mut response = result.map_err(|err| {
            tracing::debug!(%method, %url, error = %err, "request failed");
            NetError::Transport(err)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(NetError::Transport)?;
        tracing::debug!(%method, %url, status, body_bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            status_text: status_text(status),
            headers,
            body,
        })
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        target: &mut T,
        headers: Option<&Headers>,
    ) -> Result<()> {
        let response = self.execute(build_get_json(url, headers))?;
        parse_json_response(&response, target)
    }

    pub fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        target: &mut T,
        headers: Option<&Headers>,
    ) -> Result<()> {
        let response = self.execute(build_post_json(url, body, headers)?)?;
        parse_json_response(&response, target)
    }

    pub fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        target: &mut T,
        headers: Option<&Headers>,
    ) -> Result<()> {
        let response = self.execute(build_put_json(url, body, headers)?)?;
        parse_json_response(&response, target)
    }

    pub fn delete_json<T: DeserializeOwned>(
        &self,
        url: &str,
        target: &mut T,
        headers: Option<&Headers>,
    ) -> Result<()> {
        let response = self.execute(build_delete_json(url, headers))?;
        parse_json_response(&response, target)
    }

    pub fn get(&self, url: &str, headers: Option<&Headers>) -> Result<HttpResponse> {
        self.execute(build_plain(HttpMethod::Get, url, headers))
    }

    pub fn delete(&self, url: &str, headers: Option<&Headers>) -> Result<HttpResponse> {
        self.execute(build_plain(HttpMethod::Delete, url, headers))
    }

    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.execute(build_plain(HttpMethod::Get, url, None))?;
        parse_download(response)
    }

    pub fn upload(
        &self,
        url: &str,
        field_name: &str,
        file_path: &Path,
        fields: Option<&HashMap<String, String>>,
        headers: Option<&Headers>,
    ) -> Result<HttpResponse> {
        let request = build_upload(url, field_name, file_path, fields, headers)?;
        self.execute(request)
    }
}

/// Build a reusable client with the given timeout and pool limits.
pub fn create_http_client(
    timeout: Duration,
    max_idle_connections: usize,
    max_idle_connections_per_host: usize,
    max_connections_per_host: usize,
) -> HttpClient {
    HttpClient::new(ClientConfig {
        timeout,
        max_idle_connections,
        max_idle_connections_per_host,
        max_connections_per_host,
    })
}

fn to_http<B>(
    method: HttpMethod,
    url: &str,
    headers: &[(String, String)],
    body: B,
) -> Result<http::Request<B>> {
    let mut builder = http::Request::builder().method(method.as_str()).uri(url);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(body)
        .map_err(|err| NetError::InvalidRequest(format!("{url}: {err}")))
}
