use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    /// 0 binds a random port (tests).
    pub port: u16,
    /// Chat sessions are dropped after this long without a request.
    #[serde(default = "default_session_expiry_hours")]
    pub session_expiry_hours: i64,
}

fn default_session_expiry_hours() -> i64 {
    24
}

/// Where the documentation/chat backend lives and how long each call may take.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL including the `/api` prefix, e.g. `http://localhost:4000/api`.
    pub base_url: String,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Documentation generation is slow on large repositories.
    #[serde(default = "default_documentation_timeout_secs")]
    pub documentation_timeout_secs: u64,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    /// Refuse to start when the backend is down.
    #[serde(default = "default_require_healthy_on_start")]
    pub require_healthy_on_start: bool,
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_documentation_timeout_secs() -> u64 {
    300
}

fn default_chat_timeout_secs() -> u64 {
    60
}

fn default_require_healthy_on_start() -> bool {
    true
}

impl BackendSettings {
    /// Settings with the default timeouts for the given base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            health_timeout_secs: default_health_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            documentation_timeout_secs: default_documentation_timeout_secs(),
            chat_timeout_secs: default_chat_timeout_secs(),
            require_healthy_on_start: default_require_healthy_on_start(),
        }
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn documentation_timeout(&self) -> Duration {
        Duration::from_secs(self.documentation_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilitySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_json_logs")]
    pub json_logs: bool,
    /// OTLP collector endpoint (e.g. `http://tempo:4317`); span export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: default_json_logs(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logs() -> bool {
    true
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    chat_core::config::load_configuration("repo-chat")
}
