//! Distance ranking of facilities around a reference point

use tracing::{debug, warn};

use crate::distance::annotate;
use crate::models::{FacilityRecord, GeoCoordinate, RankedFacility, RankedFeed};

/// Rank facilities by distance from `reference`, closest first.
///
/// Without a reference the records come back in feed order with no
/// distance. With one, every record is annotated before sorting; records
/// whose coordinates cannot be parsed are dropped and counted in
/// [`RankedFeed::skipped`]. The sort is stable, so equal distances keep
/// their feed order.
#[must_use]
pub fn rank(records: &[FacilityRecord], reference: Option<&GeoCoordinate>) -> RankedFeed {
    let Some(reference) = reference else {
        debug!("No reference coordinate, keeping feed order");
        return RankedFeed {
            facilities: records.iter().cloned().map(RankedFacility::unranked).collect(),
            skipped: 0,
        };
    };

    let mut skipped = 0;
    let mut facilities: Vec<RankedFacility> = records
        .iter()
        .filter_map(|record| match annotate(record, reference) {
            Ok(ranked) => Some(ranked),
            Err(e) => {
                warn!("Excluding facility from ranking: {}", e);
                skipped += 1;
                None
            }
        })
        .collect();

    facilities.sort_by(|a, b| distance_key(a).total_cmp(&distance_key(b)));

    if skipped > 0 {
        warn!(
            "Skipped {} of {} facilities with invalid coordinates",
            skipped,
            records.len()
        );
    }
    debug!(
        "Ranked {} facilities around {}",
        facilities.len(),
        reference.format_coordinates()
    );

    RankedFeed {
        facilities,
        skipped,
    }
}

fn distance_key(facility: &RankedFacility) -> f64 {
    facility.distance.unwrap_or(f64::INFINITY)
}
