//! Great-circle distance between a facility and the reference point

use crate::Result;
use crate::models::{FacilityRecord, GeoCoordinate, RankedFacility};

/// Mean Earth radius in statute miles used for all distances
pub const EARTH_RADIUS_MILES: f64 = 3961.0;

/// Haversine distance in miles between two coordinates
#[must_use]
pub fn haversine_miles(from: &GeoCoordinate, to: &GeoCoordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // rounding can push `a` just outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Annotated copy of `record` carrying its distance from `reference`.
///
/// Fails with `InvalidCoordinate` when the record's coordinates are not
/// finite numbers, so NaN never reaches a sort comparison.
pub fn annotate(record: &FacilityRecord, reference: &GeoCoordinate) -> Result<RankedFacility> {
    let location = record.coordinate()?;
    Ok(RankedFacility {
        record: record.clone(),
        distance: Some(haversine_miles(&location, reference)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CareFinderError;
    use rstest::rstest;

    const TAMPA: GeoCoordinate = GeoCoordinate {
        latitude: 27.9506,
        longitude: -82.4572,
    };

    fn facility(latitude: &str, longitude: &str) -> FacilityRecord {
        FacilityRecord {
            title: "Test ER".to_string(),
            display_name: None,
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            description: "5 minutes".to_string(),
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_miles(&TAMPA, &TAMPA), 0.0);
    }

    #[rstest]
    #[case(GeoCoordinate::new(27.9378, -82.4412), 1.318)]
    #[case(GeoCoordinate::new(28.5383, -81.3792), 77.206)]
    fn test_known_distances(#[case] other: GeoCoordinate, #[case] expected: f64) {
        let miles = haversine_miles(&other, &TAMPA);
        assert!((miles - expected).abs() < 0.01, "got {miles}");
    }

    #[rstest]
    #[case(GeoCoordinate::new(27.9378, -82.4412))]
    #[case(GeoCoordinate::new(-33.8688, 151.2093))]
    #[case(GeoCoordinate::new(64.1466, -21.9426))]
    fn test_distance_is_symmetric(#[case] other: GeoCoordinate) {
        let there = haversine_miles(&TAMPA, &other);
        let back = haversine_miles(&other, &TAMPA);
        assert!((there - back).abs() < 1e-9);
        assert!(there >= 0.0);
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let north = GeoCoordinate::new(90.0, 0.0);
        let south = GeoCoordinate::new(-90.0, 0.0);
        let miles = haversine_miles(&north, &south);
        assert!((miles - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }

    #[rstest]
    #[case(GeoCoordinate::new(-87.843, -179.0), GeoCoordinate::new(87.843, 0.999999999))]
    #[case(GeoCoordinate::new(45.0, 10.0), GeoCoordinate::new(-45.0, -170.0))]
    #[case(GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0, 180.0))]
    fn test_near_antipodal_distance_is_finite(
        #[case] from: GeoCoordinate,
        #[case] to: GeoCoordinate,
    ) {
        let miles = haversine_miles(&from, &to);
        assert!(miles.is_finite(), "got {miles}");
        assert!(miles >= 0.0);
        assert!(miles <= std::f64::consts::PI * EARTH_RADIUS_MILES + 1e-6);
    }

    #[test]
    fn test_annotate_returns_copy_with_distance() {
        let record = facility("27.9378", "-82.4412");
        let ranked = annotate(&record, &TAMPA).unwrap();
        assert_eq!(ranked.record, record);
        let distance = ranked.distance.unwrap();
        assert!((distance - 1.318).abs() < 0.01);
    }

    #[test]
    fn test_annotate_rejects_non_numeric_coordinates() {
        let record = facility("n/a", "-82.4412");
        assert!(matches!(
            annotate(&record, &TAMPA),
            Err(CareFinderError::InvalidCoordinate { .. })
        ));
    }
}
