use axum::{
    body::{Body, Bytes},
    debug_handler,
    extract::State,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use futures_util::stream::{self, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::{counter, histogram};
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

const FORM_MIME: &str = "application/x-www-form-urlencoded";

/// Behaviour of the stub `/request` endpoint.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Status returned for well-formed requests.
    pub status: StatusCode,
    /// 1-based request number answered with a 500.
    pub fail_on: Option<u64>,
    pub delay: Option<Duration>,
    /// Requests above this rate are answered with a 429.
    pub max_tps: Option<NonZeroU32>,
    /// Successful responses advertise more body bytes than are sent.
    pub truncate_body: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            fail_on: None,
            delay: None,
            max_tps: None,
            truncate_body: false,
        }
    }
}

impl MockConfig {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn fail_on(mut self, nth: u64) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_tps(mut self, max_tps: NonZeroU32) -> Self {
        self.max_tps = Some(max_tps);
        self
    }

    pub fn truncate_body(mut self) -> Self {
        self.truncate_body = true;
        self
    }
}

/// A request as seen by the stub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedRequest {
    pub method: Method,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct MockState {
    config: MockConfig,
    count: AtomicU64,
    requests: Mutex<Vec<ObservedRequest>>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        let limiter = config
            .max_tps
            .map(|tps| RateLimiter::direct(Quota::per_second(tps)));
        Self {
            config,
            count: AtomicU64::new(0),
            requests: Mutex::new(vec![]),
            limiter,
        }
    }

    pub fn request_count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ObservedRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn observe(&self, request: ObservedRequest) -> u64 {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn app(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/request", post(request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the stub on `addr` until the process exits.
pub async fn run(addr: SocketAddr, config: MockConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, app(Arc::new(MockState::new(config)))).await?;
    Ok(())
}

/// Bind `addr` (port 0 picks a free port) and serve the stub in the background.
pub async fn spawn(addr: SocketAddr, config: MockConfig) -> anyhow::Result<MockHandle> {
    let listener = TcpListener::bind(&addr).await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(MockState::new(config));

    let router = app(state.clone());
    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!("Mock service stopped: {err}");
        }
    });

    Ok(MockHandle { addr, state, task })
}

/// Background stub server; aborted on drop.
pub struct MockHandle {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockHandle {
    pub fn url(&self) -> String {
        format!("http://{}/request", self.addr)
    }

    pub fn request_count(&self) -> u64 {
        self.state.request_count()
    }

    pub fn requests(&self) -> Vec<ObservedRequest> {
        self.state.requests()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[debug_handler]
pub async fn request(
    State(state): State<Arc<MockState>>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    counter!("mock-service.requests").increment(1);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let nth = state.observe(ObservedRequest {
        method,
        content_type: content_type.clone(),
        body: body.clone(),
    });

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!(nth, "Rate limited");
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
    }

    if let Some(delay) = state.config.delay {
        tokio::time::sleep(delay).await;
    }

    if state.config.fail_on == Some(nth) {
        debug!(nth, "Injected failure");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let is_form = content_type
        .as_deref()
        .map_or(false, |ct| ct.starts_with(FORM_MIME));
    if !is_form {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let salt = url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == "salt")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    if salt.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    if !state.config.status.is_success() {
        return state.config.status.into_response();
    }

    if state.config.truncate_body {
        return truncated(state.config.status, format!("captcha for {salt}"));
    }

    (
        state.config.status,
        [(CONTENT_TYPE, "text/plain")],
        format!("captcha for {salt}"),
    )
        .into_response()
}

/// Send `body` followed by a stream error, while promising twice its length.
fn truncated(status: StatusCode, body: String) -> Response {
    let promised = body.len() * 2;
    let head = stream::iter([Ok::<_, std::io::Error>(Bytes::from(body))]);
    // NOTE: The pause lets the head and first chunk reach the client before the connection drops.
    let tail = stream::once(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Err::<Bytes, _>(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "body truncated",
        ))
    });

    (
        status,
        [
            (CONTENT_TYPE, "text/plain".to_string()),
            (CONTENT_LENGTH, promised.to_string()),
        ],
        Body::from_stream(head.chain(tail)),
    )
        .into_response()
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = TPS_MEASURE.swap(0, Ordering::Relaxed);
        if transactions > 0 {
            info!("{transactions} TPS");
        }
        histogram!("mock-service.tps").record(transactions as f64);
    }
}
