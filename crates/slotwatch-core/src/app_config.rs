use std::net::SocketAddr;
use std::path::PathBuf;

/// Process-level configuration, loaded once at startup from the environment.
///
/// Everything map- or list-shaped (the office directory, the weekday
/// schedule, the base form fields) lives in the YAML files pointed at by
/// `offices_path` and `watch_path` instead.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub offices_path: PathBuf,
    pub watch_path: PathBuf,
    /// Origin of the appointment site. Overridable so tests can point the
    /// pipeline at a local mock server.
    pub base_url: String,
    pub user_agent: String,
    /// Connection-level timeout only; requests carry no total deadline and
    /// rely on the transport's own behavior.
    pub connect_timeout_secs: u64,
    pub geocoding_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("offices_path", &self.offices_path)
            .field("watch_path", &self.watch_path)
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field(
                "geocoding_api_key",
                &self.geocoding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
