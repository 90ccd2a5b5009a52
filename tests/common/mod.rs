//! In-process stand-in for the data.gouv.fr API.
//!
//! Every request is recorded (method, path, auth headers, JSON or multipart
//! body) and answered with the canned reply registered for its method and
//! path. Unknown routes get an empty 404.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: String,
    delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, Some("application/json"), &body.to_string())
    }

    pub fn raw(status: u16, content_type: Option<&'static str>, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::raw(status, None, "")
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub user_agent: Option<String>,
    pub json: Option<Value>,
    pub fields: Vec<Field>,
}

impl Seen {
    pub fn field(&self, name: &str) -> &Field {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no multipart field `{name}` in {self:?}"))
    }
}

#[derive(Clone, Default)]
pub struct MockApi {
    routes: Arc<Mutex<HashMap<(String, String), Reply>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reply for `method` on `path` (relative to `/api/1`).
    pub fn on(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Serves on an ephemeral port and returns the API root URL.
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/1")
    }
}

async fn handle(State(api): State<MockApi>, req: Request) -> Response {
    // Header reads borrow the request, which must not live across an await.
    let (mut seen, content_type) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let seen = Seen {
            method: req.method().to_string(),
            path: req.uri().path().trim_start_matches("/api/1").to_string(),
            api_key: header("x-api-key"),
            user_agent: header("user-agent"),
            json: None,
            fields: Vec::new(),
        };
        (seen, header("content-type").unwrap_or_default())
    };

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &()).await.unwrap();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let text = field.text().await.unwrap();
            seen.fields.push(Field {
                name,
                file_name,
                content_type,
                text,
            });
        }
    } else {
        let bytes = to_bytes(req.into_body(), usize::MAX).await.unwrap();
        if !bytes.is_empty() {
            seen.json = serde_json::from_slice(&bytes).ok();
        }
    }

    let key = (seen.method.clone(), seen.path.clone());
    api.seen.lock().unwrap().push(seen);
    let reply = api.routes.lock().unwrap().get(&key).cloned();

    let Some(reply) = reply else {
        return StatusCode::NOT_FOUND.into_response();
    };
    tokio::time::sleep(reply.delay).await;

    let mut builder = Response::builder().status(reply.status);
    if let Some(ct) = reply.content_type {
        builder = builder.header(CONTENT_TYPE, ct);
    }
    builder.body(Body::from(reply.body)).unwrap()
}
