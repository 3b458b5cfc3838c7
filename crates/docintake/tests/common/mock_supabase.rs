//! Recording stand-in for the Supabase Storage and PostgREST APIs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::Router;

use super::Reply;

/// One HTTP call as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedCall {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct Script {
    /// Keyed by `"<METHOD> <path>"`.
    replies: HashMap<String, Vec<Reply>>,
    calls: Vec<RecordedCall>,
}

/// Replies are consumed in order and the last one repeats. Unscripted calls
/// get `200 []`.
#[derive(Clone, Default)]
pub struct MockSupabase {
    script: Arc<Mutex<Script>>,
}

impl MockSupabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(format!("{} {}", method, path), replies);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Starts the server and returns its base URL (the project URL).
    pub async fn spawn(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn next_reply(&self, call: RecordedCall) -> Reply {
        let mut script = self.script.lock().unwrap();
        let key = format!("{} {}", call.method, call.path);
        let reply = script
            .replies
            .get_mut(&key)
            .and_then(|replies| {
                if replies.len() > 1 {
                    Some(replies.remove(0))
                } else {
                    replies.first().cloned()
                }
            })
            .unwrap_or_else(|| Reply::Json(serde_json::json!([])));
        script.calls.push(call);
        reply
    }
}

async fn handle(
    State(mock): State<MockSupabase>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    let query = reqwest::Url::parse(&format!("http://mock{}", uri))
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default();
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    mock.next_reply(RecordedCall {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query,
        headers,
        body: body.to_vec(),
    })
}
