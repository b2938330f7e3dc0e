use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One allowed appointment window for a single weekday.
///
/// Hours are in the 24-hour clock; an appointment matches when its hour lies
/// in `[start_hour, end_hour)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub allowed: bool,
}

/// User-defined polling settings, loaded once from the watch file and
/// immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSettings {
    /// Home street address, geocoded at startup.
    pub home: String,
    pub max_distance_miles: f64,
    pub check_every_minutes: u64,
    pub seconds_between_requests: u64,
    pub find_appointment_within_days: f64,
    /// When true, poll the behind-the-wheel drive-test flow instead of the
    /// office-visit flow.
    pub drive_test: bool,
    /// Weekday (0 = Sunday .. 6 = Saturday) to allowed window.
    pub schedule: BTreeMap<u8, ScheduleWindow>,
    /// Base form fields submitted with the initial request. `officeId`,
    /// `numberItems`, and the mode flag are overridden per office.
    pub form_fields: BTreeMap<String, String>,
}

/// Load and validate the watch settings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watch_settings(path: &Path) -> Result<WatchSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let settings: WatchSettings = serde_yaml::from_str(&content)?;

    validate_watch_settings(&settings)?;

    Ok(settings)
}

fn validate_watch_settings(settings: &WatchSettings) -> Result<(), ConfigError> {
    if settings.home.trim().is_empty() {
        return Err(ConfigError::Validation(
            "home address must be non-empty".to_string(),
        ));
    }

    if settings.max_distance_miles <= 0.0 {
        return Err(ConfigError::Validation(
            "max_distance_miles must be positive".to_string(),
        ));
    }

    if settings.check_every_minutes == 0 {
        return Err(ConfigError::Validation(
            "check_every_minutes must be at least 1".to_string(),
        ));
    }

    if settings.find_appointment_within_days <= 0.0 {
        return Err(ConfigError::Validation(
            "find_appointment_within_days must be positive".to_string(),
        ));
    }

    for (weekday, window) in &settings.schedule {
        if *weekday > 6 {
            return Err(ConfigError::Validation(format!(
                "schedule weekday {weekday} is out of range (0 = Sunday .. 6 = Saturday)"
            )));
        }

        if window.end_hour > 24 || window.start_hour >= window.end_hour {
            return Err(ConfigError::Validation(format!(
                "schedule weekday {weekday} has an invalid window {}..{}",
                window.start_hour, window.end_hour
            )));
        }
    }

    Ok(())
}
