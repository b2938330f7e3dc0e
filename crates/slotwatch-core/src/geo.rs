//! Great-circle distance math and the office directory filter.

use crate::offices::Office;

/// Mean earth radius in meters, as used by the haversine formula.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const MILES_PER_METER: f64 = 0.000_621_371;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// An office retained by the distance filter, annotated with its computed
/// distance from home.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyOffice {
    pub office: Office,
    pub distance_miles: f64,
}

/// Haversine great-circle distance between two coordinates, in meters.
#[must_use]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Returns the offices within `max_miles` of `home`, each annotated with its
/// computed distance in miles.
///
/// Output order equals input order; no sorting by distance is performed. An
/// empty result is not an error — it just means nothing is in range.
#[must_use]
pub fn filter_nearby(directory: &[Office], home: Coordinate, max_miles: f64) -> Vec<NearbyOffice> {
    directory
        .iter()
        .filter_map(|office| {
            let distance_miles = MILES_PER_METER
                * distance_meters(
                    home,
                    Coordinate {
                        lat: office.lat,
                        lng: office.lng,
                    },
                );
            (distance_miles <= max_miles).then(|| NearbyOffice {
                office: office.clone(),
                distance_miles,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(name: &str, lat: f64, lng: f64) -> Office {
        Office {
            name: name.to_string(),
            id: "1".to_string(),
            lat,
            lng,
        }
    }

    const HOME: Coordinate = Coordinate {
        lat: 37.374,
        lng: -121.858,
    };

    #[test]
    fn san_jose_is_within_fifty_miles() {
        let directory = vec![office("SJ", 37.35, -121.85)];
        let nearby = filter_nearby(&directory, HOME, 50.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].office.name, "SJ");
        let d = nearby[0].distance_miles;
        assert!((1.5..2.0).contains(&d), "unexpected distance: {d}");
    }

    #[test]
    fn offices_beyond_radius_are_excluded() {
        let directory = vec![
            office("near", 37.35, -121.85),
            // Sacramento, ~100 miles out.
            office("far", 38.58, -121.49),
        ];
        let nearby = filter_nearby(&directory, HOME, 50.0);
        let names: Vec<_> = nearby.iter().map(|n| n.office.name.as_str()).collect();
        assert_eq!(names, ["near"]);
    }

    #[test]
    fn output_preserves_input_order() {
        let directory = vec![
            office("b", 37.36, -121.86),
            office("a", 37.35, -121.85),
            office("c", 37.37, -121.87),
        ];
        let nearby = filter_nearby(&directory, HOME, 50.0);
        let names: Vec<_> = nearby.iter().map(|n| n.office.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn empty_result_when_nothing_in_range() {
        let directory = vec![office("far", 38.58, -121.49)];
        assert!(filter_nearby(&directory, HOME, 10.0).is_empty());
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let d = distance_meters(HOME, HOME);
        assert!(d.abs() < 1e-6);
    }
}
