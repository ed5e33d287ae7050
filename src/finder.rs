//! Closest-ER pipeline
//!
//! Composes the resolver, the feed client, the ranking and the formatter.
//! Each step is awaited in turn and the first failure ends the pipeline,
//! so callers get either a full answer or a single error.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    Result,
    feed::FacilityFeed,
    location_resolver::LocationResolver,
    models::{AddressContext, GeoCoordinate},
    ranking::rank,
    speech::{SpeechResult, format_closest},
};

/// Finds and describes the closest ER for a reference point
#[derive(Clone)]
pub struct ClosestErService {
    resolver: LocationResolver,
    feed: Arc<dyn FacilityFeed>,
    feed_hostname: String,
    feed_path: String,
}

impl ClosestErService {
    pub fn new(
        resolver: LocationResolver,
        feed: Arc<dyn FacilityFeed>,
        feed_hostname: impl Into<String>,
        feed_path: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            feed,
            feed_hostname: feed_hostname.into(),
            feed_path: feed_path.into(),
        }
    }

    /// Geocode the user's address into a session address context
    pub async fn resolve_address(&self, address: &str) -> Result<AddressContext> {
        self.resolver.resolve_context(address).await
    }

    /// Fetch the feed, rank it around `reference` and describe the closest ER
    #[instrument(skip(self, reference), fields(reference = ?reference))]
    pub async fn closest(&self, reference: Option<&GeoCoordinate>) -> Result<SpeechResult> {
        let records = self.feed.fetch(&self.feed_hostname, &self.feed_path).await?;
        let ranked = rank(&records, reference);
        let result = format_closest(&ranked)?;

        info!(
            facility = %result.facility_name,
            distance_miles = ?result.distance_miles,
            candidates = ranked.len(),
            skipped = ranked.skipped,
            "Selected closest ER"
        );

        Ok(result)
    }

    /// Resolve `address` and answer for it; the feed is not fetched when
    /// geocoding fails
    pub async fn closest_to_address(&self, address: &str) -> Result<(AddressContext, SpeechResult)> {
        let context = self.resolve_address(address).await?;
        let result = self.closest(Some(&context.location)).await?;
        Ok((context, result))
    }
}
