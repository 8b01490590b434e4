//! Local stand-in for the `generateContent` endpoint.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use ngk_buddy::llm::providers::gemini::{ApiKeySource, GeminiProvider};

pub const MODEL: &str = "gemini-test";
pub const KEY: &str = "test-key";

#[derive(Default)]
pub struct MockState {
    pub hits: AtomicUsize,
    pub status: Mutex<u16>,
    pub body: Mutex<String>,
    pub last_path: Mutex<Option<String>>,
    pub last_query: Mutex<Option<String>>,
    pub last_request: Mutex<Option<String>>,
    /// When set, each request waits for one `notify_one` before answering.
    pub hold: Mutex<Option<Arc<Notify>>>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockServer {
    pub async fn start(status: u16, body: &str) -> Self {
        let state = Arc::new(MockState::default());
        *state.status.lock().unwrap() = status;
        *state.body.lock().unwrap() = body.to_string();

        let app = Router::new()
            .route("/v1beta/models/{call}", post(generate))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta/models", self.addr)
    }

    pub fn provider(&self, key: Option<&str>) -> GeminiProvider {
        GeminiProvider::new(
            self.base_url(),
            MODEL.to_string(),
            ApiKeySource::Static(key.map(str::to_string)),
        )
        .unwrap()
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_request_json(&self) -> serde_json::Value {
        let raw = self.state.last_request.lock().unwrap().clone().expect("no request seen");
        serde_json::from_str(&raw).unwrap()
    }
}

async fn generate(State(state): State<Arc<MockState>>, uri: Uri, body: String) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_path.lock().unwrap() = Some(uri.path().to_string());
    *state.last_query.lock().unwrap() = uri.query().map(str::to_string);
    *state.last_request.lock().unwrap() = Some(body);

    let hold = state.hold.lock().unwrap().clone();
    if let Some(release) = hold {
        release.notified().await;
    }

    let status = StatusCode::from_u16(*state.status.lock().unwrap()).unwrap();
    let body = state.body.lock().unwrap().clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
