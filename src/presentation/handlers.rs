// HTTP request handlers
use crate::application::sensor_gateway::{ReadingsDevice, TimeWindow, UpstreamRoute};
use crate::domain::session::Session;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response, passthrough_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::{AppError, AppResult};
use crate::presentation::session::BearerToken;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub device_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilesQuery {
    pub event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingsQuery {
    pub instrument_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl WindowQuery {
    fn into_window(self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// A required identifier; blank counts as missing.
fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing(name))
}

async fn forward(state: &AppState, route: UpstreamRoute) -> AppResult<Response> {
    let body = state.proxy_service.forward(route).await?;
    passthrough_response(body).map_err(AppError::Response)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_devices(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    forward(&state, UpstreamRoute::Devices).await
}

pub async fn device_alarms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> AppResult<Response> {
    let device_id = required(query.device_id, "deviceId")?;
    forward(&state, UpstreamRoute::Alarms { device_id }).await
}

pub async fn device_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> AppResult<Response> {
    let device_id = required(query.device_id, "deviceId")?;
    let window = TimeWindow::new(query.start, query.end);
    forward(&state, UpstreamRoute::Events { device_id, window }).await
}

pub async fn event_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventFilesQuery>,
) -> AppResult<Response> {
    let event_id = required(query.event_id, "eventId")?;
    forward(&state, UpstreamRoute::EventFiles { event_id }).await
}

pub async fn background_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> AppResult<Response> {
    let device_id = required(query.device_id, "deviceId")?;
    let window = TimeWindow::new(query.start, query.end);
    forward(&state, UpstreamRoute::Background { device_id, window }).await
}

async fn device_readings(
    state: &AppState,
    device: ReadingsDevice,
    query: ReadingsQuery,
) -> AppResult<Response> {
    let instrument_id = required(query.instrument_id, "instrumentId")?;
    let route = UpstreamRoute::Readings {
        device,
        instrument_id,
        window: TimeWindow::new(query.start, query.end),
    };
    forward(state, route).await
}

pub async fn micromate_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> AppResult<Response> {
    device_readings(&state, ReadingsDevice::Micromate, query).await
}

pub async fn um16368_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> AppResult<Response> {
    device_readings(&state, ReadingsDevice::Um16368, query).await
}

/// Verify the bearer token and return the session (user and permissions)
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<Session>> {
    Ok(Json(state.auth_service.check(&token).await?))
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> StatusCode {
    state.auth_service.sign_out(&token).await;
    StatusCode::NO_CONTENT
}

/// Downsampled vibration charts for one instrument
pub async fn instrument_vibration(
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<WindowQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response> {
    let window = query.into_window();
    let report = state.vibration_service.report(&session, &id, &window).await?;
    json_response(&report, accepts_brotli(&headers))
        .await
        .map_err(AppError::Response)
}

pub async fn project_map(session: Session, State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let markers = state.project_service.map_markers(&session).await?;
    Ok(Json(markers).into_response())
}

/// Stream a project's dashboard (progressive loading)
pub async fn stream_project_dashboard(
    session: Session,
    Path(project_id): Path<i64>,
    Query(query): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response> {
    let rx = state
        .streaming_service
        .stream_project(&session, project_id, query.into_window())
        .await?;
    Ok(stream_from_receiver(rx).into_response())
}
