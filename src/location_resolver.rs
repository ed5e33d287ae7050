//! Location Resolution Module
//!
//! This module resolves the user's free-text address into the coordinate
//! used as the ranking reference point.

use std::sync::Arc;

use crate::geocoding::GeocodingProvider;
use crate::models::{AddressContext, GeoCoordinate};
use crate::{CareFinderError, Result};
use tracing::{debug, instrument};

/// Service for resolving address text into coordinates
#[derive(Clone)]
pub struct LocationResolver {
    provider: Arc<dyn GeocodingProvider>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>) -> Self {
        Self { provider }
    }

    /// Resolve an address to the coordinate of the provider's first match.
    ///
    /// Later candidates are ignored; there is no disambiguation.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<GeoCoordinate> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CareFinderError::geocode(address, "empty address"));
        }

        let candidates = self.provider.candidates(address).await?;
        let Some(first) = candidates.into_iter().next() else {
            return Err(CareFinderError::geocode(address, "no candidates returned"));
        };

        debug!(
            "Resolved to {} ({})",
            first.formatted_address.as_deref().unwrap_or(address),
            first.location.format_coordinates()
        );

        Ok(first.location)
    }

    /// Resolve an address and wrap it into the session's address context
    pub async fn resolve_context(&self, address: &str) -> Result<AddressContext> {
        let location = self.resolve(address).await?;
        Ok(AddressContext::new(address.trim().to_string(), location))
    }
}
