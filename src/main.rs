// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::application::auth_service::AuthService;
use crate::application::monitor_repository::InstrumentRepository;
use crate::application::project_service::ProjectService;
use crate::application::proxy_service::ProxyService;
use crate::application::sensor_gateway::SensorGateway;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::vibration_service::{ChartSettings, VibrationService};
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::sensor_gateway::HttpSensorGateway;
use crate::infrastructure::supabase_repository::SupabaseRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vibration_monitor=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_monitor_config()?;
    let timeout = Duration::from_secs(config.upstream.timeout_secs);
    tracing::debug!("Loaded configuration: {:?}", config);

    // Create adapters (infrastructure layer)
    let supabase = Arc::new(SupabaseRepository::new(&config.supabase, timeout)?);
    let repository: Arc<dyn InstrumentRepository> = supabase.clone();
    let gateway: Arc<dyn SensorGateway> =
        Arc::new(HttpSensorGateway::new(&config.syscom, &config.readings, timeout)?);

    // Create services (application layer)
    let vibration_service = VibrationService::new(
        repository.clone(),
        gateway.clone(),
        ChartSettings {
            max_points: config.charts.max_points,
            overlay: config.charts.overlay,
        },
    );
    let state = Arc::new(AppState {
        proxy_service: ProxyService::new(gateway),
        auth_service: AuthService::new(
            supabase,
            repository.clone(),
            Duration::from_secs(config.auth.session_ttl_secs),
        ),
        project_service: ProjectService::new(repository.clone()),
        streaming_service: StreamingDashboardService::new(repository, vibration_service.clone()),
        vibration_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting vibration-monitor service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
