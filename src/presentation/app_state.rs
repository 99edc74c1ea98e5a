// Application state for HTTP handlers
use crate::application::auth_service::AuthService;
use crate::application::project_service::ProjectService;
use crate::application::proxy_service::ProxyService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::vibration_service::VibrationService;

#[derive(Clone)]
pub struct AppState {
    pub proxy_service: ProxyService,
    pub auth_service: AuthService,
    pub vibration_service: VibrationService,
    pub project_service: ProjectService,
    pub streaming_service: StreamingDashboardService,
}
