use crate::application::auth_service::DEFAULT_SESSION_TTL;
use crate::domain::overlay::OverlayStyle;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub server: ServerSettings,
    pub syscom: SyscomSettings,
    #[serde(default)]
    pub readings: ReadingsSettings,
    pub supabase: SupabaseSettings,
    pub charts: ChartsSettings,
    pub upstream: UpstreamSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct SyscomSettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Deserialize, Clone, Default)]
pub struct ReadingsSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsSettings {
    pub max_points: usize,
    pub overlay: OverlayStyle,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub session_ttl_secs: u64,
}

// Keys stay out of logs.
impl fmt::Debug for SyscomSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyscomSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for ReadingsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadingsSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("charts.max_points", 500)?
        .set_default("charts.overlay", "zones")?
        .set_default("upstream.timeout_secs", 30)?
        .set_default("auth.session_ttl_secs", DEFAULT_SESSION_TTL.as_secs())?)
}

/// Load `config/monitor.toml` (optional) overridden by `MONITOR__*` environment variables.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(
            config::Environment::with_prefix("MONITOR")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
