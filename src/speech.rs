//! Selection and spoken formatting of the closest facility

use quick_xml::escape::escape;
use serde::Serialize;

use crate::messages::{BREAK, FOLLOW_UPS, SAY_THAT_AGAIN};
use crate::models::RankedFeed;
use crate::{CareFinderError, Result};

/// Spoken answer for the closest facility
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechResult {
    /// SSML body (without the surrounding `<speak>` element)
    pub speech: String,
    pub reprompt: String,
    pub facility_name: String,
    /// Distance rounded to one decimal place
    pub distance_miles: Option<f64>,
    pub wait_minutes: Option<String>,
}

/// Compose the answer for the head of the ranked feed.
///
/// The wait time is the first whitespace-delimited token of the facility's
/// `description`; the feed publishes it as e.g. "11 minutes".
pub fn format_closest(ranked: &RankedFeed) -> Result<SpeechResult> {
    let closest = ranked.closest().ok_or(CareFinderError::EmptyFeed)?;
    let record = &closest.record;

    let facility_name = record.spoken_name().to_string();
    let distance_miles = closest.distance.map(round_to_tenth);
    let wait_minutes = record.wait_minutes().map(str::to_string);

    let mut speech = match distance_miles {
        Some(miles) => format!(
            "The closest ER is {}, {:.1} miles away. {BREAK}",
            escape_ssml(&facility_name),
            miles
        ),
        None => format!(
            "The first ER listed is {}. {BREAK}",
            escape_ssml(&facility_name)
        ),
    };

    match &wait_minutes {
        Some(minutes) => speech.push_str(&format!(
            "Current wait time is {} minutes. {BREAK}",
            escape_ssml(minutes)
        )),
        None => speech.push_str(&format!("The current wait time is not available. {BREAK}")),
    }
    speech.push_str(FOLLOW_UPS);

    Ok(SpeechResult {
        speech,
        reprompt: SAY_THAT_AGAIN.to_string(),
        facility_name,
        distance_miles,
        wait_minutes,
    })
}

fn round_to_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

/// Escape text for embedding in SSML
#[must_use]
pub fn escape_ssml(text: &str) -> String {
    escape(text).into_owned()
}
