//! One HTTP request per call against the data.gouv.fr `/api/1` endpoints.
//!
//! Every call expects exactly one success status. Anything else, including
//! a success status carrying a non-JSON body, becomes an [`Error`].

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::table::Table;
use crate::util::{endpoint, is_json_content_type};

/// Value of the `User-Agent` header sent with every request.
pub const CLIENT_USER_AGENT: &str = concat!(
    "datagouv-rs/",
    env!("CARGO_PKG_VERSION"),
    " - https://docs.rs/datagouv"
);

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

// data.gouv.fr sniffs the upload and stores it as CSV regardless.
const CSV_CONTENT_TYPE: &str = "application/vnd.ms-excel";

#[derive(Debug, Clone)]
pub struct Transport {
    http: HttpClient,
    base_url: String,
    headers: HeaderMap,
}

impl Transport {
    /// Wraps a caller-owned HTTP session. The session is shared, never closed
    /// here.
    pub fn new(http: HttpClient, base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let mut key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| Error::InvalidHeader(API_KEY_HEADER.to_string()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /datasets/{id}/`, 200.
    pub async fn fetch_dataset(&self, dataset_id: &str) -> Result<Value> {
        let url = endpoint(&self.base_url, &["datasets", dataset_id]);
        let req = self.http.get(&url);
        self.execute(req, Method::GET, &url, StatusCode::OK).await
    }

    /// `POST /datasets/{id}/upload/` as multipart, 201.
    pub async fn upload_resource(
        &self,
        dataset_id: &str,
        filename: &str,
        table: &Table,
    ) -> Result<Value> {
        let url = endpoint(&self.base_url, &["datasets", dataset_id, "upload"]);
        let form = Form::new()
            .part("file", csv_part(table, filename.to_string())?)
            .text("filename", filename.to_string());

        let req = self.http.post(&url).multipart(form);
        self.execute(req, Method::POST, &url, StatusCode::CREATED).await
    }

    /// `POST /datasets/{id}/resources/{rid}/upload/` as multipart, 200.
    ///
    /// The stored file keeps the resource id as its name while `filename`
    /// carries the human readable `<resource_name>.csv`.
    pub async fn replace_resource(
        &self,
        dataset_id: &str,
        resource_id: &str,
        table: &Table,
        resource_name: &str,
    ) -> Result<Value> {
        let url = endpoint(
            &self.base_url,
            &["datasets", dataset_id, "resources", resource_id, "upload"],
        );
        let form = Form::new()
            .text("filename", format!("{}.csv", resource_name))
            .part("file", csv_part(table, format!("{}.csv", resource_id))?);

        let req = self.http.post(&url).multipart(form);
        self.execute(req, Method::POST, &url, StatusCode::OK).await
    }

    /// `PUT /datasets/{id}/resources/{rid}/` with a JSON body, 200.
    pub async fn set_resource_metadata<T: Serialize + ?Sized>(
        &self,
        dataset_id: &str,
        resource_id: &str,
        metadata: &T,
    ) -> Result<Value> {
        let url = endpoint(&self.base_url, &["datasets", dataset_id, "resources", resource_id]);
        let req = self.http.put(&url).json(metadata);
        self.execute(req, Method::PUT, &url, StatusCode::OK).await
    }

    /// `PUT /datasets/{id}/` with a JSON body, 200.
    pub async fn set_dataset_metadata<T: Serialize + ?Sized>(
        &self,
        dataset_id: &str,
        metadata: &T,
    ) -> Result<Value> {
        let url = endpoint(&self.base_url, &["datasets", dataset_id]);
        let req = self.http.put(&url).json(metadata);
        self.execute(req, Method::PUT, &url, StatusCode::OK).await
    }

    /// `DELETE /datasets/{id}/resources/{rid}/`, 204. An empty body yields
    /// `Value::Null`.
    pub async fn delete_resource(&self, dataset_id: &str, resource_id: &str) -> Result<Value> {
        let url = endpoint(&self.base_url, &["datasets", dataset_id, "resources", resource_id]);
        let req = self.http.delete(&url);
        self.execute(req, Method::DELETE, &url, StatusCode::NO_CONTENT).await
    }

    async fn execute(
        &self,
        req: RequestBuilder,
        method: Method,
        url: &str,
        expected: StatusCode,
    ) -> Result<Value> {
        tracing::debug!(%method, url, "sending request");
        let resp = req.headers(self.headers.clone()).send().await?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;
        tracing::debug!(
            %method,
            url,
            status = status.as_u16(),
            bytes = body.len(),
            "received response"
        );

        let outcome = classify(method, url, expected, status, content_type.as_deref(), &body);
        if let Err(e) = &outcome {
            tracing::warn!(url, error = %e, "request rejected");
        }
        outcome
    }
}

fn csv_part(table: &Table, file_name: String) -> Result<Part> {
    let bytes = table.to_csv()?;
    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(CSV_CONTENT_TYPE)?)
}

/// Turns a received response into the JSON body or the matching error.
fn classify(
    method: Method,
    url: &str,
    expected: StatusCode,
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Value> {
    if status != expected {
        return Err(Error::UnexpectedStatus {
            method,
            url: url.to_string(),
            expected,
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    if status == StatusCode::NO_CONTENT && body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    let content_type = content_type.unwrap_or("");
    if !is_json_content_type(content_type) {
        return Err(Error::UnexpectedContentType {
            url: url.to_string(),
            content_type: if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type.to_string()
            },
        });
    }

    serde_json::from_slice(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}
