//! Emergency-room facility records as delivered by the wait-time feed

use serde::{Deserialize, Deserializer, Serialize};

use super::GeoCoordinate;
use crate::{CareFinderError, Result};

/// One ER location from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub title: String,
    /// Overrides `title` for speech when present and non-empty
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    /// Stringified decimal degrees
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    /// Stringified decimal degrees
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    /// Starts with the wait time in minutes, e.g. "11 minutes"
    #[serde(default)]
    pub description: String,
}

impl FacilityRecord {
    /// Name to speak: `displayName` when present and non-empty, else `title`
    #[must_use]
    pub fn spoken_name(&self) -> &str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.title,
        }
    }

    /// Wait time token from the description.
    ///
    /// The feed format puts the minutes as the first whitespace-delimited
    /// token of `description` ("11 minutes" -> "11"). Nothing else in the
    /// description is interpreted.
    #[must_use]
    pub fn wait_minutes(&self) -> Option<&str> {
        self.description.split_whitespace().next()
    }

    /// Parse the stringified coordinates
    pub fn coordinate(&self) -> Result<GeoCoordinate> {
        let latitude = parse_degrees(&self.latitude).ok_or_else(|| {
            CareFinderError::invalid_coordinate(&self.title, format!("latitude '{}'", self.latitude))
        })?;
        let longitude = parse_degrees(&self.longitude).ok_or_else(|| {
            CareFinderError::invalid_coordinate(
                &self.title,
                format!("longitude '{}'", self.longitude),
            )
        })?;

        let coordinate = GeoCoordinate::new(latitude, longitude);
        if !coordinate.is_valid() {
            return Err(CareFinderError::invalid_coordinate(
                &self.title,
                format!("out of range ({})", coordinate.format_coordinates()),
            ));
        }
        Ok(coordinate)
    }
}

fn parse_degrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `"27.93"` as well as `27.93`
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// A facility annotated with its distance from the reference point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFacility {
    pub record: FacilityRecord,
    /// Great-circle miles; `None` when ranked without a reference coordinate
    pub distance: Option<f64>,
}

impl RankedFacility {
    /// Wrap a record without a distance
    #[must_use]
    pub fn unranked(record: FacilityRecord) -> Self {
        Self {
            record,
            distance: None,
        }
    }
}

/// Facilities in ascending distance order (or feed order without a reference)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedFeed {
    pub facilities: Vec<RankedFacility>,
    /// Records excluded because their coordinates could not be parsed
    pub skipped: usize,
}

impl RankedFeed {
    #[must_use]
    pub fn closest(&self) -> Option<&RankedFacility> {
        self.facilities.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
