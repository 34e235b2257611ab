//! Local HTTP server that mimics the tracker's room pages and status API.

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use architracker::{FetchError, HttpTrackerClient, RoomStatus, TrackerConfig, TrackerSource};

use super::TWO_ROW_PAGE;

/// How long the "slow" routes stall before answering
pub const SLOW_ROUTE_DELAY: Duration = Duration::from_secs(10);

/// Body served by the off-tracker service that redirects must never reach
pub const INTERNAL_BODY: &str = "INTERNAL-METADATA";

#[derive(Clone, Default)]
struct StubState {
    /// Where `/room/redirect-away` points
    redirect_target: String,
    /// (path, user agent) of every request seen
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubState {
    fn record(&self, path: String, headers: &HeaderMap) {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.requests.lock().unwrap().push((path, user_agent));
    }
}

pub struct StubTracker {
    addr: SocketAddr,
    state: StubState,
    internal_hits: Arc<AtomicUsize>,
}

impl StubTracker {
    pub async fn start() -> StubTracker {
        // separate service on another host name ("localhost" vs the tracker's 127.0.0.1)
        let internal_hits = Arc::new(AtomicUsize::new(0));
        let hits = internal_hits.clone();
        let internal = Router::new().route(
            "/secret",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    INTERNAL_BODY
                }
            }),
        );
        let internal_addr = spawn_server(internal).await;

        let state = StubState {
            redirect_target: format!("http://localhost:{}/secret", internal_addr.port()),
            requests: Arc::default(),
        };
        let app = Router::new()
            .route("/room/:code", get(room_page))
            .route("/api/room_status/:code", get(room_status))
            .with_state(state.clone());
        let addr = spawn_server(app).await;

        StubTracker { addr, state, internal_hits }
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).unwrap()
    }

    /// Tracker config whose API base points at this stub
    pub fn config(&self, request_timeout: Duration) -> TrackerConfig {
        TrackerConfig {
            api_base: self.url("/api/"),
            request_timeout,
            ..TrackerConfig::default()
        }
    }

    pub fn client(&self, request_timeout: Duration) -> HttpTrackerClient {
        HttpTrackerClient::new(&self.config(request_timeout)).unwrap()
    }

    /// Real HTTP client whose page requests are redirected to this stub
    pub fn loopback(&self, request_timeout: Duration) -> LoopbackSource {
        LoopbackSource {
            client: self.client(request_timeout),
            base: self.url("/"),
        }
    }

    /// User-Agent values received on requests whose path starts with `prefix`
    pub fn user_agents(&self, prefix: &str) -> Vec<String> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(_, agent)| agent.clone())
            .collect()
    }

    pub fn internal_hits(&self) -> usize {
        self.internal_hits.load(Ordering::SeqCst)
    }
}

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn room_page(State(state): State<StubState>, Path(code): Path<String>, headers: HeaderMap) -> Response {
    state.record(format!("/room/{code}"), &headers);

    match code.as_str() {
        "AbCd12" => html(TWO_ROW_PAGE),
        "slow" => {
            tokio::time::sleep(SLOW_ROUTE_DELAY).await;
            html(TWO_ROW_PAGE)
        }
        "moved" => (StatusCode::FOUND, [(header::LOCATION, "/room/AbCd12")]).into_response(),
        "redirect-away" => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, state.redirect_target.clone())],
        )
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn room_status(State(state): State<StubState>, Path(code): Path<String>, headers: HeaderMap) -> Response {
    state.record(format!("/api/room_status/{code}"), &headers);

    match code.as_str() {
        "good" => (
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"last_activity":"2024-01-01T00:00:00","last_port":38281,"timeout":7200}"#,
        )
            .into_response(),
        "garbage" => (StatusCode::OK, "<html>definitely not json</html>").into_response(),
        "slow" => {
            tokio::time::sleep(SLOW_ROUTE_DELAY).await;
            (StatusCode::OK, "{}").into_response()
        }
        _ => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
    }
}

fn html(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

/// TrackerSource that keeps the validated page path but sends it to the stub
pub struct LoopbackSource {
    client: HttpTrackerClient,
    base: Url,
}

#[async_trait]
impl TrackerSource for LoopbackSource {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let local = self.base.join(url.path()).unwrap();
        self.client.fetch_html(&local).await
    }

    async fn fetch_status(&self, room_code: &str) -> Option<RoomStatus> {
        self.client.fetch_status(room_code).await
    }
}
