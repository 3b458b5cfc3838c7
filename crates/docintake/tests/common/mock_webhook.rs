//! Scripted stand-in for the intake webhook.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

pub const WEBHOOK_PATH: &str = "/webhook/renom-doc";

/// What the mock answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(serde_json::Value),
    Text(String),
    Status(u16, String),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            Reply::Text(text) => (StatusCode::OK, text).into_response(),
            Reply::Status(code, body) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, body).into_response()
            }
        }
    }
}

/// One multipart request as the mock saw it.
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file_bytes: Vec<u8>,
}

impl RecordedRequest {
    pub fn action(&self) -> &str {
        self.fields.get("action").map(String::as_str).unwrap_or_default()
    }
}

#[derive(Default)]
struct Script {
    /// Keyed by uploaded file name.
    rename: HashMap<String, Vec<Reply>>,
    /// Keyed by `nouveau_nom`.
    classify: HashMap<String, Vec<Reply>>,
    requests: Vec<RecordedRequest>,
}

/// Replies are consumed in order; the last one repeats. Unscripted requests
/// get a 500.
#[derive(Clone, Default)]
pub struct MockWebhook {
    script: Arc<Mutex<Script>>,
}

impl MockWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_rename(&self, file: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .rename
            .insert(file.to_string(), replies);
        self
    }

    pub fn on_classify(&self, new_name: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .classify
            .insert(new_name.to_string(), replies);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn count(&self, action: &str, file: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.action() == action && r.file_name.as_deref() == Some(file))
            .count()
    }

    /// Starts the server on an ephemeral port and returns the webhook URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route(WEBHOOK_PATH, post(handle))
            .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}{}", addr, WEBHOOK_PATH)
    }

    fn next_reply(&self, request: RecordedRequest) -> Reply {
        let mut script = self.script.lock().unwrap();
        let key = match request.action() {
            "renommage" => request.file_name.clone(),
            _ => request.fields.get("nouveau_nom").cloned(),
        };
        let table = if request.action() == "renommage" {
            &mut script.rename
        } else {
            &mut script.classify
        };
        let reply = key
            .and_then(|key| table.get_mut(&key))
            .and_then(|replies| {
                if replies.len() > 1 {
                    Some(replies.remove(0))
                } else {
                    replies.first().cloned()
                }
            })
            .unwrap_or_else(|| Reply::Status(500, "no scripted reply".to_string()));
        script.requests.push(request);
        reply
    }
}

async fn handle(State(mock): State<MockWebhook>, mut multipart: Multipart) -> Reply {
    let mut request = RecordedRequest::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" {
            request.file_name = field.file_name().map(str::to_string);
            request.content_type = field.content_type().map(str::to_string);
            request.file_bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        } else {
            let value = field.text().await.unwrap_or_default();
            request.fields.insert(name, value);
        }
    }
    mock.next_reply(request)
}
