//! Request builders and response parsers for the JSON helpers.
//!
//! # Design
//! Every helper is split into a `build_*` function that produces an
//! `HttpRequest` and a `parse_*` function that consumes an `HttpResponse`.
//! Neither half touches the network; `HttpClient` executes the round trip in
//! between. This keeps header defaults, status classification, and the
//! decode/status precedence testable without a server.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::http::{status_text, Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;

const JSON: &str = "application/json";

pub fn build_get_json(url: &str, headers: Option<&Headers>) -> HttpRequest {
    json_request(HttpMethod::Get, url, None, headers)
}

pub fn build_post_json<B: Serialize + ?Sized>(
    url: &str,
    body: &B,
    headers: Option<&Headers>,
) -> Result<HttpRequest> {
    let body = serde_json::to_vec(body).map_err(NetError::Encode)?;
    Ok(json_request(HttpMethod::Post, url, Some(body), headers))
}

pub fn build_put_json<B: Serialize + ?Sized>(
    url: &str,
    body: &B,
    headers: Option<&Headers>,
) -> Result<HttpRequest> {
    let body = serde_json::to_vec(body).map_err(NetError::Encode)?;
    Ok(json_request(HttpMethod::Put, url, Some(body), headers))
}

pub fn build_delete_json(url: &str, headers: Option<&Headers>) -> HttpRequest {
    json_request(HttpMethod::Delete, url, None, headers)
}

/// A bodyless request carrying only the caller's headers.
pub fn build_plain(method: HttpMethod, url: &str, headers: Option<&Headers>) -> HttpRequest {
    let mut request = HttpRequest::new(method, url);
    request.apply_headers(headers);
    request
}

/// Build a multipart upload of the file at `path` under `field_name`.
///
/// The file is opened and copied into the body here; it is closed before
/// this function returns, whatever happens afterwards.
pub fn build_upload(
    url: &str,
    field_name: &str,
    path: &Path,
    fields: Option<&HashMap<String, String>>,
    headers: Option<&Headers>,
) -> Result<HttpRequest> {
    let file = File::open(path).map_err(|source| NetError::Filesystem {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut form = MultipartForm::new();
    form.file(field_name, &filename, file)
        .map_err(NetError::Multipart)?;
    if let Some(fields) = fields {
        let sorted: BTreeMap<_, _> = fields.iter().collect();
        for (name, value) in sorted {
            form.text(name, value);
        }
    }

    let mut request = HttpRequest::new(HttpMethod::Post, url);
    request.set_header("Content-Type", &form.content_type());
    request.body = Some(form.finish());
    request.apply_headers(headers);
    Ok(request)
}

/// Decode the body into `target`, then classify the status.
///
/// Decoding is attempted whatever the status. A decode failure is reported
/// in preference to a status failure; on a non-2xx status with a valid body
/// `target` still holds the decoded value.
pub fn parse_json_response<T: DeserializeOwned>(
    response: &HttpResponse,
    target: &mut T,
) -> Result<()> {
    let decoded = decode_into(&response.body, target);
    let status = check_status(response);
    decoded?;
    status
}

/// Return the body of a successful response; the body is not inspected.
pub fn parse_download(response: HttpResponse) -> Result<Vec<u8>> {
    check_status(&response)?;
    Ok(response.body)
}

/// Map a non-success status code to `NetError::HttpStatus`.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let status = if response.status_text.is_empty() {
        status_text(response.status)
    } else {
        response.status_text.clone()
    };
    Err(NetError::HttpStatus {
        code: response.status,
        status,
    })
}

fn json_request(
    method: HttpMethod,
    url: &str,
    body: Option<Vec<u8>>,
    headers: Option<&Headers>,
) -> HttpRequest {
    let mut request = HttpRequest::new(method, url);
    request.set_header("Content-Type", JSON);
    request.set_header("Accept", JSON);
    request.body = body;
    request.apply_headers(headers);
    request
}

/// Decode the first JSON value in `body`; trailing bytes are ignored.
fn decode_into<T: DeserializeOwned>(body: &[u8], target: &mut T) -> Result<()> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    *target = <T as Deserialize>::deserialize(&mut deserializer).map_err(NetError::Decode)?;
    Ok(())
}
