//! In-process mock of the registry HTTP API
//!
//! The server runs on its own thread and runtime so it can serve both async
//! tests and spawned CLI binaries. It lives until the test process exits.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Default, Clone)]
struct Fixtures {
    ids: Vec<String>,
    metadata: HashMap<String, Value>,
    artifacts: HashMap<(String, String), Vec<u8>>,
}

/// Builder for a mock registry
#[derive(Default)]
pub struct MockRegistry {
    fixtures: Fixtures,
}

/// A running mock registry
pub struct RunningRegistry {
    /// Base URL including the `/v1` prefix
    pub base_url: String,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A published reproduction with one `repro/steps.sh` script of
    /// `script_bytes` bytes
    pub fn with_ready_reproduction(self, id: &str, title: &str, script_bytes: usize) -> Self {
        self.with_reproduction(
            id,
            json!({
                "id": id,
                "title": title,
                "status": "published",
                "artifacts": [
                    {"category": "writeup", "path": "README.md", "size": 900},
                    {"category": "reproduction_script", "path": "repro/steps.sh", "size": script_bytes}
                ]
            }),
        )
        .with_artifact(id, "repro/steps.sh", &vec![b'#'; script_bytes])
    }

    /// List `id` and serve `metadata` for it
    pub fn with_reproduction(mut self, id: &str, metadata: Value) -> Self {
        self.fixtures.ids.push(id.to_string());
        self.fixtures.metadata.insert(id.to_string(), metadata);
        self
    }

    /// List `id` without serving metadata for it
    pub fn with_listed_id(mut self, id: &str) -> Self {
        self.fixtures.ids.push(id.to_string());
        self
    }

    pub fn with_artifact(mut self, id: &str, path: &str, body: &[u8]) -> Self {
        self.fixtures
            .artifacts
            .insert((id.to_string(), path.to_string()), body.to_vec());
        self
    }

    pub fn start(self) -> RunningRegistry {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock registry");
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let fixtures = Arc::new(self.fixtures);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock registry runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router(fixtures)).await.unwrap();
            });
        });

        RunningRegistry {
            base_url: format!("http://{addr}/v1"),
        }
    }
}

fn router(fixtures: Arc<Fixtures>) -> Router {
    Router::new()
        .route("/v1/reproductions", get(list))
        .route("/v1/reproductions/{id}", get(metadata))
        .route("/v1/reproductions/{id}/artifacts/{*path}", get(artifact))
        .with_state(fixtures)
}

async fn list(State(fixtures): State<Arc<Fixtures>>) -> Json<Value> {
    let entries: Vec<Value> = fixtures.ids.iter().map(|id| json!({ "id": id })).collect();
    Json(json!({ "reproductions": entries }))
}

async fn metadata(State(fixtures): State<Arc<Fixtures>>, Path(id): Path<String>) -> Response {
    match fixtures.metadata.get(&id) {
        Some(metadata) => Json(metadata.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn artifact(
    State(fixtures): State<Arc<Fixtures>>,
    Path((id, path)): Path<(String, String)>,
) -> Response {
    match fixtures.artifacts.get(&(id, path)) {
        Some(body) => Bytes::from(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
