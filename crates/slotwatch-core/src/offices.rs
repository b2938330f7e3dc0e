use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A physical office offering appointments, as declared in the directory
/// file. Immutable once loaded; distance annotation happens during filtering
/// (see [`crate::geo::filter_nearby`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub name: String,
    /// Stable office identifier understood by the appointment site.
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct OfficesFile {
    pub offices: Vec<Office>,
}

/// Load and validate the office directory from a YAML file.
///
/// The file order is preserved: the poll scheduler visits offices in exactly
/// the order they are listed here.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_offices(path: &Path) -> Result<OfficesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let offices_file: OfficesFile = serde_yaml::from_str(&content)?;

    validate_offices(&offices_file)?;

    Ok(offices_file)
}

fn validate_offices(offices_file: &OfficesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for office in &offices_file.offices {
        if office.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "office name must be non-empty".to_string(),
            ));
        }

        if office.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "office '{}' has an empty id",
                office.name
            )));
        }

        if !(-90.0..=90.0).contains(&office.lat) || !(-180.0..=180.0).contains(&office.lng) {
            return Err(ConfigError::Validation(format!(
                "office '{}' has out-of-range coordinates ({}, {})",
                office.name, office.lat, office.lng
            )));
        }

        if !seen_names.insert(office.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate office name: '{}'",
                office.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<(), ConfigError> {
        let file: OfficesFile = serde_yaml::from_str(yaml).unwrap();
        validate_offices(&file)
    }

    #[test]
    fn valid_directory_passes() {
        let yaml = r#"
offices:
  - name: San Jose
    id: "516"
    lat: 37.35
    lng: -121.85
  - name: Santa Clara
    id: "632"
    lat: 37.3512
    lng: -121.9686
"#;
        assert!(parse(yaml).is_ok());
    }

    #[test]
    fn duplicate_names_rejected() {
        let yaml = r#"
offices:
  - name: San Jose
    id: "516"
    lat: 37.35
    lng: -121.85
  - name: san jose
    id: "517"
    lat: 37.36
    lng: -121.86
"#;
        let err = parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_id_rejected() {
        let yaml = r#"
offices:
  - name: San Jose
    id: ""
    lat: 37.35
    lng: -121.85
"#;
        assert!(parse(yaml).is_err());
    }

    #[test]
    fn out_of_range_coordinates_rejected() {
        let yaml = r#"
offices:
  - name: Nowhere
    id: "1"
    lat: 97.0
    lng: -121.85
"#;
        assert!(parse(yaml).is_err());
    }

    #[test]
    fn order_is_preserved() {
        let yaml = r#"
offices:
  - name: B
    id: "2"
    lat: 0.0
    lng: 0.0
  - name: A
    id: "1"
    lat: 0.0
    lng: 0.0
"#;
        let file: OfficesFile = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = file.offices.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
