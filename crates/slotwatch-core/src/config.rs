use crate::app_config::AppConfig;
use crate::ConfigError;

/// User agent sent with every request to the appointment site. The site
/// rejects obviously non-browser clients, so this mimics a desktop browser.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows; U; Windows NT 5.1; en-US; rv:1.8.1.13) Gecko/20080311 Firefox/2.0.0.13";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let bind_addr = parse_addr("SLOTWATCH_BIND_ADDR", "0.0.0.0:3005")?;
    let log_level = or_default("SLOTWATCH_LOG_LEVEL", "info");
    let offices_path = PathBuf::from(or_default("SLOTWATCH_OFFICES_PATH", "./config/offices.yaml"));
    let watch_path = PathBuf::from(or_default("SLOTWATCH_WATCH_PATH", "./config/watch.yaml"));
    let base_url = or_default("SLOTWATCH_BASE_URL", "https://www.dmv.ca.gov");
    let user_agent = or_default("SLOTWATCH_USER_AGENT", DEFAULT_USER_AGENT);
    let connect_timeout_secs = parse_u64("SLOTWATCH_CONNECT_TIMEOUT_SECS", "10")?;
    let geocoding_api_key = lookup("GEOCODING_API_KEY").ok();

    Ok(AppConfig {
        bind_addr,
        log_level,
        offices_path,
        watch_path,
        base_url,
        user_agent,
        connect_timeout_secs,
        geocoding_api_key,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3005");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.base_url, "https://www.dmv.ca.gov");
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.geocoding_api_key.is_none());
    }

    #[test]
    fn overrides_are_honored() {
        let mut map = HashMap::new();
        map.insert("SLOTWATCH_BIND_ADDR", "127.0.0.1:9000");
        map.insert("SLOTWATCH_BASE_URL", "http://127.0.0.1:8080");
        map.insert("GEOCODING_API_KEY", "k");
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.geocoding_api_key.as_deref(), Some("k"));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let mut map = HashMap::new();
        map.insert("SLOTWATCH_BIND_ADDR", "not-an-addr");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut map = HashMap::new();
        map.insert("SLOTWATCH_CONNECT_TIMEOUT_SECS", "soon");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut map = HashMap::new();
        map.insert("GEOCODING_API_KEY", "super-secret");
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
