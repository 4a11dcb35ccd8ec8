//! One-shot helpers that build a fresh client for every call.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::http::{Headers, HttpResponse};
use crate::transport::{HttpClient, DEFAULT_TIMEOUT, UPLOAD_TIMEOUT};

/// GET `url` and decode the JSON response into `target`.
///
/// The body is decoded whatever the status; see
/// [`parse_json_response`](crate::client::parse_json_response) for how a
/// decode failure and a non-2xx status are reported.
pub fn get_json<T: DeserializeOwned>(
    url: &str,
    target: &mut T,
    headers: Option<&Headers>,
) -> Result<()> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).get_json(url, target, headers)
}

/// POST `body` as JSON and decode the JSON response into `target`.
pub fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    url: &str,
    body: &B,
    target: &mut T,
    headers: Option<&Headers>,
) -> Result<()> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).post_json(url, body, target, headers)
}

/// PUT `body` as JSON and decode the JSON response into `target`.
pub fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    url: &str,
    body: &B,
    target: &mut T,
    headers: Option<&Headers>,
) -> Result<()> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).put_json(url, body, target, headers)
}

/// DELETE `url` and decode the JSON response into `target`.
pub fn delete_json<T: DeserializeOwned>(
    url: &str,
    target: &mut T,
    headers: Option<&Headers>,
) -> Result<()> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).delete_json(url, target, headers)
}

pub fn get(url: &str, headers: Option<&Headers>) -> Result<HttpResponse> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).get(url, headers)
}

pub fn delete(url: &str, headers: Option<&Headers>) -> Result<HttpResponse> {
    HttpClient::with_timeout(DEFAULT_TIMEOUT).delete(url, headers)
}

/// Download `url` into memory. No size limit is applied.
///
/// A `timeout_secs` of zero disables the timeout.
pub fn download_file(url: &str, timeout_secs: u64) -> Result<Vec<u8>> {
    HttpClient::with_timeout(Duration::from_secs(timeout_secs)).download(url)
}

/// Upload the file at `file_path` as a multipart form under `field_name`.
///
/// The response is returned as-is: the status is not classified and the
/// body is not decoded.
pub fn upload_file(
    url: &str,
    field_name: &str,
    file_path: impl AsRef<Path>,
    fields: Option<&HashMap<String, String>>,
    headers: Option<&Headers>,
) -> Result<HttpResponse> {
    HttpClient::with_timeout(UPLOAD_TIMEOUT).upload(
        url,
        field_name,
        file_path.as_ref(),
        fields,
        headers,
    )
}
