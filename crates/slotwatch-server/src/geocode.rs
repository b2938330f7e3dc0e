//! Home address geocoding.

use serde_json::Value;
use thiserror::Error;

use slotwatch_core::Coordinate;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Used whenever the home address cannot be resolved. Inherited quirk: the
/// process keeps running against this coordinate instead of failing, so a bad
/// address or missing key degrades to a warning, never an exit.
const FALLBACK_HOME: Coordinate = Coordinate {
    lat: 37.374,
    lng: -121.858,
};

#[derive(Debug, Error)]
enum GeocodeError {
    #[error("no geocoding api key configured")]
    MissingKey,

    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned status {0}")]
    Status(u16),

    #[error("geocoder response has no usable geometry")]
    NoGeometry,
}

/// Resolves the home address to a coordinate, falling back to
/// [`FALLBACK_HOME`] (with a warning) on any failure.
pub async fn resolve_home(
    client: &reqwest::Client,
    address: &str,
    api_key: Option<&str>,
) -> Coordinate {
    match lookup(client, GEOCODE_URL, address, api_key).await {
        Ok(coordinate) => {
            tracing::info!(%address, lat = coordinate.lat, lng = coordinate.lng, "geocoded home address");
            coordinate
        }
        Err(e) => {
            tracing::warn!(%address, error = %e, "geocoding failed; using fallback coordinate");
            FALLBACK_HOME
        }
    }
}

async fn lookup(
    client: &reqwest::Client,
    base_url: &str,
    address: &str,
    api_key: Option<&str>,
) -> Result<Coordinate, GeocodeError> {
    let api_key = api_key.ok_or(GeocodeError::MissingKey)?;

    let response = client
        .get(base_url)
        .query(&[("address", address), ("key", api_key)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::Status(status.as_u16()));
    }

    let body: Value = response.json().await?;
    let location = body
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(|result| result.get("geometry"))
        .and_then(|geometry| geometry.get("location"))
        .ok_or(GeocodeError::NoGeometry)?;

    let lat = location
        .get("lat")
        .and_then(Value::as_f64)
        .ok_or(GeocodeError::NoGeometry)?;
    let lng = location
        .get("lng")
        .and_then(Value::as_f64)
        .ok_or(GeocodeError::NoGeometry)?;

    Ok(Coordinate { lat, lng })
}
