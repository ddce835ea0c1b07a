use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Form;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::engine::EngineError;
use crate::engine::EngineHandle;
use crate::engine::Intent;
use crate::engine::LogEntry;
use crate::engine::LogEvent;
use crate::frontends::shutdown_requested;
use crate::render;

/// How many log lines the HTML page shows.
const PAGE_LOG_LINES: usize = 50;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// Response for every endpoint that changes state
#[derive(Serialize)]
struct EventsResponse {
    events: Vec<LogEvent>,
}

#[derive(Deserialize)]
struct CommandRequest {
    line: String,
}

#[derive(Deserialize)]
struct ThermostatRequest {
    value: i64,
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    #[serde(default)]
    since: u64,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    version: &'static str,
    engine: EngineHandle,
    refresh_ms: u64,
}

enum ApiError {
    Engine(EngineError),
    UnknownToggle(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Engine(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
            ApiError::UnknownToggle(key) => (
                StatusCode::NOT_FOUND,
                format!("Unknown toggle '{}'", key),
            )
                .into_response(),
        }
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /v1/state
#[tracing::instrument(skip(state))]
async fn snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.snapshot().as_ref().clone())
}

/// Handler for GET /v1/charts
#[tracing::instrument(skip(state))]
async fn charts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(render::charts(&state.engine.snapshot()))
}

/// Handler for GET /v1/log
#[tracing::instrument(skip(state))]
async fn log(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    Ok(Json(state.engine.log_since(query.since).await?))
}

/// Handler for POST /v1/command
#[tracing::instrument(skip(state, req))]
async fn command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<EventsResponse>, ApiError> {
    tracing::debug!("Submitting command line: {}", req.line);
    let events = state.engine.submit(req.line).await?;
    Ok(Json(EventsResponse { events }))
}

/// Handler for POST /v1/devices/:device/toggle
#[tracing::instrument(skip(state))]
async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(device): Path<String>,
) -> Result<Json<EventsResponse>, ApiError> {
    let intent = Intent::toggle(&device).ok_or(ApiError::UnknownToggle(device))?;
    apply(&state, intent).await
}

/// Handler for POST /v1/thermostat
#[tracing::instrument(skip(state, req))]
async fn thermostat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ThermostatRequest>,
) -> Result<Json<EventsResponse>, ApiError> {
    apply(&state, Intent::SetThermostat(req.value)).await
}

/// Handler for POST /v1/city/aqi/refresh
#[tracing::instrument(skip(state))]
async fn refresh_aqi(State(state): State<Arc<AppState>>) -> Result<Json<EventsResponse>, ApiError> {
    apply(&state, Intent::RefreshAqi).await
}

/// Handler for POST /v1/factory/cooling-boost
#[tracing::instrument(skip(state))]
async fn cooling_boost(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventsResponse>, ApiError> {
    apply(&state, Intent::CoolingBoost).await
}

async fn apply(state: &AppState, intent: Intent) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.engine.apply(intent).await?;
    Ok(Json(EventsResponse { events }))
}

/// Handler for GET /
#[tracing::instrument(skip(state))]
async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let snapshot = state.engine.snapshot();
    let mut log = state.engine.log_since(0).await?;
    let keep_from = log.len().saturating_sub(PAGE_LOG_LINES);
    log.drain(..keep_from);
    Ok(Html(render::page(&snapshot, &log, state.refresh_ms)))
}

/// Handlers for the HTML page's forms; each redirects back to the page.
mod ui {
    use super::*;

    #[derive(Deserialize)]
    pub(super) struct ThermostatForm {
        value: i64,
    }

    #[derive(Deserialize)]
    pub(super) struct CommandForm {
        line: String,
    }

    fn back() -> Redirect {
        Redirect::to("/")
    }

    pub(super) async fn toggle(
        State(state): State<Arc<AppState>>,
        Path(key): Path<String>,
    ) -> Result<Redirect, ApiError> {
        let intent = Intent::toggle(&key).ok_or(ApiError::UnknownToggle(key))?;
        state.engine.apply(intent).await?;
        Ok(back())
    }

    pub(super) async fn thermostat(
        State(state): State<Arc<AppState>>,
        Form(form): Form<ThermostatForm>,
    ) -> Result<Redirect, ApiError> {
        state.engine.apply(Intent::SetThermostat(form.value)).await?;
        Ok(back())
    }

    pub(super) async fn aqi(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
        state.engine.apply(Intent::RefreshAqi).await?;
        Ok(back())
    }

    pub(super) async fn cooling(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
        state.engine.apply(Intent::CoolingBoost).await?;
        Ok(back())
    }

    pub(super) async fn command(
        State(state): State<Arc<AppState>>,
        Form(form): Form<CommandForm>,
    ) -> Result<Redirect, ApiError> {
        state.engine.submit(form.line).await?;
        Ok(back())
    }
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/state", get(snapshot))
        .route("/v1/charts", get(charts))
        .route("/v1/log", get(log))
        .route("/v1/command", post(command))
        .route("/v1/devices/:device/toggle", post(toggle))
        .route("/v1/thermostat", post(thermostat))
        .route("/v1/city/aqi/refresh", post(refresh_aqi))
        .route("/v1/factory/cooling-boost", post(cooling_boost))
        .route("/ui/toggle/:key", post(ui::toggle))
        .route("/ui/thermostat", post(ui::thermostat))
        .route("/ui/aqi", post(ui::aqi))
        .route("/ui/cooling", post(ui::cooling))
        .route("/ui/command", post(ui::command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP dashboard and API server
///
/// Binds to `listen:port` and serves until `shutdown` becomes `true`.
pub async fn serve(
    listen: &str,
    port: u16,
    engine: EngineHandle,
    refresh_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    let state = Arc::new(AppState {
        version,
        engine,
        refresh_ms,
    });
    let app = create_router(state);

    let addr = listen_addr(listen, port)?;
    tracing::info!("Starting HTTP dashboard on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_requested(&mut shutdown).await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await?;

    Ok(())
}

/// Socket address for an IPv4 or IPv6 listen address.
fn listen_addr(listen: &str, port: u16) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::new(listen.parse::<IpAddr>()?, port))
}
