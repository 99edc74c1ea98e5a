// reqwest-backed gateway to the Syscom public API and the readings endpoints
use crate::application::sensor_gateway::{SensorGateway, UpstreamBody, UpstreamError, UpstreamRoute};
use crate::infrastructure::config::{ReadingsSettings, SyscomSettings};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

const SYSCOM_KEY_HEADER: &str = "x-scs-api-key";
const READINGS_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
struct Upstream {
    base_url: String,
    key_header: &'static str,
    api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpSensorGateway {
    client: reqwest::Client,
    syscom: Upstream,
    readings: Option<Upstream>,
}

impl HttpSensorGateway {
    pub fn new(
        syscom: &SyscomSettings,
        readings: &ReadingsSettings,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            syscom: Upstream {
                base_url: syscom.base_url.trim_end_matches('/').to_string(),
                key_header: SYSCOM_KEY_HEADER,
                api_key: Some(syscom.api_key.clone()),
            },
            readings: readings.base_url.as_ref().map(|url| Upstream {
                base_url: url.trim_end_matches('/').to_string(),
                key_header: READINGS_KEY_HEADER,
                api_key: readings.api_key.clone(),
            }),
        })
    }

    fn upstream_for(&self, route: &UpstreamRoute) -> Result<&Upstream, UpstreamError> {
        if route.is_syscom() {
            Ok(&self.syscom)
        } else {
            self.readings
                .as_ref()
                .ok_or(UpstreamError::NotConfigured("readings endpoint"))
        }
    }
}

#[async_trait]
impl SensorGateway for HttpSensorGateway {
    async fn fetch(&self, route: &UpstreamRoute) -> Result<UpstreamBody, UpstreamError> {
        let upstream = self.upstream_for(route)?;
        let url = format!("{}{}", upstream.base_url, route.path());

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&route.query());
        if let Some(key) = &upstream.api_key {
            request = request.header(upstream.key_header, key);
        }

        tracing::debug!("GET {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(UpstreamBody { content_type, body })
    }
}
