//! Mock Stability backend for integration tests
//!
//! Serves `POST /v1/generation/{engine}/text-to-image` with canned
//! artifacts and records what it received

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Mock Stability API that returns predictable artifacts
pub struct MockStability {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    /// Number of requests to fail with 503 before succeeding
    fail_count: AtomicU32,
    in_flight: AtomicU32,
    peak_in_flight: AtomicU32,
    /// Time spent on each request before answering
    delay: Duration,
    /// Fixed error returned for every request, if set
    error: Option<(StatusCode, String)>,
    last_request: Mutex<Option<RecordedRequest>>,
}

/// What the mock saw on its most recent request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub engine: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl RecordedRequest {
    /// Value of a request header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Builder for mock behaviour
#[derive(Default)]
pub struct MockStabilityBuilder {
    fail_count: u32,
    delay: Duration,
    error: Option<(StatusCode, String)>,
}

impl MockStabilityBuilder {
    /// Fail the first `n` requests with 503
    pub fn failing(mut self, n: u32) -> Self {
        self.fail_count = n;
        self
    }

    /// Hold every request for `delay` before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer every request with `status` and a raw `body`
    pub fn erroring(mut self, status: StatusCode, body: &str) -> Self {
        self.error = Some((status, body.to_owned()));
        self
    }

    pub async fn start(self) -> anyhow::Result<MockStability> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(self.fail_count),
            in_flight: AtomicU32::new(0),
            peak_in_flight: AtomicU32::new(0),
            delay: self.delay,
            error: self.error,
            last_request: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/generation/{engine}/text-to-image", routing::post(handle_text_to_image))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockStability { addr, shutdown, state })
    }
}

impl MockStability {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    pub fn builder() -> MockStabilityBuilder {
        MockStabilityBuilder::default()
    }

    /// Base URL including `/v1`, as the provider appends `/generation/...`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of text-to-image requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests handled at the same time
    pub fn peak_in_flight(&self) -> u32 {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.last_request.lock().unwrap().clone()
    }
}

impl Drop for MockStability {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Deserialize)]
struct TextToImageBody {
    #[serde(default)]
    samples: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
}

async fn handle_text_to_image(
    State(state): State<Arc<MockState>>,
    Path(engine): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak_in_flight.fetch_max(now, Ordering::SeqCst);

    *state.last_request.lock().unwrap() = Some(RecordedRequest {
        engine: engine.clone(),
        headers,
        body: body.clone(),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let response = respond(&state, &engine, &body);
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

fn respond(state: &MockState, engine: &str, body: &serde_json::Value) -> Response {
    if let Some((status, ref text)) = state.error {
        return (status, text.clone()).into_response();
    }

    let remaining = state.fail_count.load(Ordering::SeqCst);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::SeqCst);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "id": "mock", "name": "unavailable", "message": "engine overloaded" })),
        )
            .into_response();
    }

    let request: TextToImageBody = match serde_json::from_value(body.clone()) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "message": format!("invalid body: {e}") })),
            )
                .into_response();
        }
    };

    let seed = request.seed.unwrap_or(0);
    let artifacts: Vec<_> = (0..request.samples.unwrap_or(1))
        .map(|i| {
            serde_json::json!({
                "base64": STANDARD.encode(format!("{engine}-{i}")),
                "seed": seed + u64::from(i),
                "finishReason": "SUCCESS",
            })
        })
        .collect();

    Json(serde_json::json!({ "artifacts": artifacts })).into_response()
}
