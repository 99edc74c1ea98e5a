// Gateway trait for the upstream sensor-data APIs (Syscom and the readings endpoints)
use async_trait::async_trait;
use bytes::Bytes;

/// Optional `start`/`end` bounds, passed through to the upstream untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TimeWindow {
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = &self.start {
            pairs.push(("start", start.clone()));
        }
        if let Some(end) = &self.end {
            pairs.push(("end", end.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingsDevice {
    Micromate,
    Um16368,
}

impl ReadingsDevice {
    pub fn path(&self) -> &'static str {
        match self {
            ReadingsDevice::Micromate => "/micromate-readings",
            ReadingsDevice::Um16368 => "/um16368-readings",
        }
    }

    /// Key of the readings array in the response envelope.
    pub fn response_key(&self) -> &'static str {
        match self {
            ReadingsDevice::Micromate => "MicromateReadings",
            ReadingsDevice::Um16368 => "UM16368Readings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRoute {
    Devices,
    Alarms { device_id: String },
    Events { device_id: String, window: TimeWindow },
    EventFiles { event_id: String },
    Background { device_id: String, window: TimeWindow },
    Readings { device: ReadingsDevice, instrument_id: String, window: TimeWindow },
}

impl UpstreamRoute {
    pub fn is_syscom(&self) -> bool {
        !matches!(self, UpstreamRoute::Readings { .. })
    }

    /// Path below the upstream base URL, with path parameters substituted.
    pub fn path(&self) -> String {
        match self {
            UpstreamRoute::Devices => "/devices".to_string(),
            UpstreamRoute::Alarms { device_id } => {
                format!("/devices/{}/alarms", urlencoding::encode(device_id))
            }
            UpstreamRoute::Events { device_id, .. } => {
                format!("/devices/{}/events", urlencoding::encode(device_id))
            }
            UpstreamRoute::EventFiles { event_id } => {
                format!("/events/{}/files", urlencoding::encode(event_id))
            }
            UpstreamRoute::Background { device_id, .. } => {
                format!("/devices/{}/data/background", urlencoding::encode(device_id))
            }
            UpstreamRoute::Readings { device, .. } => device.path().to_string(),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            UpstreamRoute::Events { window, .. } | UpstreamRoute::Background { window, .. } => {
                window.query_pairs()
            }
            UpstreamRoute::Readings { instrument_id, window, .. } => {
                let mut pairs = vec![("instrument_id", instrument_id.clone())];
                pairs.extend(window.query_pairs());
                pairs
            }
            _ => Vec::new(),
        }
    }
}

/// A successful upstream response, kept as raw bytes so it can be forwarded verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamBody {
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream {0} is not configured")]
    NotConfigured(&'static str),
}

#[async_trait]
pub trait SensorGateway: Send + Sync {
    /// GET the route from its upstream, attaching the secret API key.
    async fn fetch(&self, route: &UpstreamRoute) -> Result<UpstreamBody, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_substitution_is_encoded() {
        let route = UpstreamRoute::Alarms {
            device_id: "12/34".to_string(),
        };
        assert_eq!(route.path(), "/devices/12%2F34/alarms");
        assert!(route.query().is_empty());
    }

    #[test]
    fn test_window_passthrough() {
        let route = UpstreamRoute::Background {
            device_id: "7".to_string(),
            window: TimeWindow::new(Some("2024-01-01T00:00:00".into()), None),
        };
        assert_eq!(route.path(), "/devices/7/data/background");
        assert_eq!(route.query(), vec![("start", "2024-01-01T00:00:00".to_string())]);
    }

    #[test]
    fn test_readings_route() {
        let route = UpstreamRoute::Readings {
            device: ReadingsDevice::Um16368,
            instrument_id: "UM-1".to_string(),
            window: TimeWindow::default(),
        };
        assert!(!route.is_syscom());
        assert_eq!(route.path(), "/um16368-readings");
        assert_eq!(route.query(), vec![("instrument_id", "UM-1".to_string())]);
    }
}
