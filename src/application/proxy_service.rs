// Proxy service - Forwards dashboard requests to the sensor-data upstreams
use crate::application::sensor_gateway::{SensorGateway, UpstreamBody, UpstreamError, UpstreamRoute};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProxyService {
    gateway: Arc<dyn SensorGateway>,
}

impl ProxyService {
    pub fn new(gateway: Arc<dyn SensorGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch the route and hand back the upstream body untouched.
    pub async fn forward(&self, route: UpstreamRoute) -> Result<UpstreamBody, UpstreamError> {
        match self.gateway.fetch(&route).await {
            Ok(body) => {
                tracing::debug!("Forwarded {} ({} bytes)", route.path(), body.body.len());
                Ok(body)
            }
            Err(e) => {
                tracing::warn!("Upstream call for {} failed: {}", route.path(), e);
                Err(e)
            }
        }
    }
}
