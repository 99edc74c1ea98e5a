// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    background_data, check_auth, device_alarms, device_events, event_files, health_check,
    instrument_vibration, list_devices, micromate_readings, project_map, sign_out,
    stream_project_dashboard, um16368_readings,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Upstream proxies; the secret keys are attached server-side
    let proxies = Router::new()
        .route("/devices", get(list_devices))
        .route("/alarms", get(device_alarms))
        .route("/events", get(device_events))
        .route("/event-files", get(event_files))
        .route("/background", get(background_data))
        .route("/micromate-readings", get(micromate_readings))
        .route("/um16368-readings", get(um16368_readings));

    let api = proxies
        .route("/check-auth", get(check_auth))
        .route("/sign-out", post(sign_out))
        .route("/instruments/:id/vibration", get(instrument_vibration))
        .route("/projects/map", get(project_map))
        .route("/projects/:id/dashboard", get(stream_project_dashboard));

    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
