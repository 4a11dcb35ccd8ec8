use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// The request body parsed as JSON, or null if it was empty or not JSON.
    pub body: Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub content_type: String,
    pub fields: BTreeMap<String, String>,
    pub files: Vec<UploadedFile>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub size: usize,
}

pub type Files = Arc<RwLock<HashMap<String, Vec<u8>>>>;

pub fn app() -> Router {
    let files: Files = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/malformed", any(malformed))
        .route("/slow/{ms}", get(slow))
        .route("/files", post(upload))
        .route("/files/{name}", get(download))
        .with_state(files)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(Echo {
        method: method.to_string(),
        query,
        headers,
        body,
    })
}

/// Respond with `code` and a small JSON body naming it.
async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "code": code, "message": status.to_string() }))))
}

async fn malformed() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        "{\"message\": not json",
    )
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept_ms": ms }))
}

/// Store every file part under its filename; text parts are echoed back.
async fn upload(
    State(files): State<Files>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReceipt>), (StatusCode, String)> {
    let mut receipt = UploadReceipt {
        content_type: headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        ..UploadReceipt::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        match filename {
            Some(filename) => {
                let data = field.bytes().await.map_err(bad_request)?;
                tracing::debug!(%name, %filename, size = data.len(), "stored upload");
                receipt.files.push(UploadedFile {
                    field: name,
                    filename: filename.clone(),
                    size: data.len(),
                });
                files.write().await.insert(filename, data.to_vec());
            }
            None => {
                let value = field.text().await.map_err(bad_request)?;
                receipt.fields.insert(name, value);
            }
        }
    }

    tracing::info!(files = receipt.files.len(), fields = receipt.fields.len(), "upload complete");
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn download(
    State(files): State<Files>,
    Path(name): Path<String>,
) -> Result<Vec<u8>, (StatusCode, Json<Value>)> {
    let files = files.read().await;
    files.get(&name).cloned().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": 404, "message": format!("no file named {name}") })),
        )
    })
}

fn bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "POST".to_string(),
            query: BTreeMap::new(),
            headers: BTreeMap::from([("accept".to_string(), "application/json".to_string())]),
            body: json!({"a": 1}),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["headers"]["accept"], "application/json");
        assert_eq!(json["body"]["a"], 1);
    }

    #[test]
    fn upload_receipt_defaults_to_empty() {
        let receipt = UploadReceipt::default();
        assert!(receipt.content_type.is_empty());
        assert!(receipt.fields.is_empty());
        assert!(receipt.files.is_empty());
    }

    #[test]
    fn bad_request_carries_message() {
        let (status, message) = bad_request("boom");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "boom");
    }
}
