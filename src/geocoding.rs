//! Geocoding client for the Google Geocoding API
//!
//! Turns a free-text address into an ordered list of candidate coordinates.
//! Picking among the candidates is left to [`crate::LocationResolver`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::models::GeoCoordinate;
use crate::{CareFinderError, Result};

/// A single geocoding match
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    /// Provider's normalized form of the address
    pub formatted_address: Option<String>,
    pub location: GeoCoordinate,
}

/// Anything that can turn address text into ordered candidates
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Candidates in provider order; an empty list means no match
    async fn candidates(&self, address: &str) -> Result<Vec<GeocodeCandidate>>;
}

/// Google Geocoding API response
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Google Geocoding API client
pub struct GoogleGeocodingClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleGeocodingClient {
    /// Create a new client
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("CareFinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CareFinderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn request_url(&self, address: &str) -> String {
        let mut url = format!("{}?address={}", self.base_url, urlencoding::encode(address));
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl GeocodingProvider for GoogleGeocodingClient {
    #[instrument(skip(self))]
    async fn candidates(&self, address: &str) -> Result<Vec<GeocodeCandidate>> {
        info!("Geocoding address");
        let start_time = Instant::now();

        let response = self
            .client
            .get(self.request_url(address))
            .send()
            .await
            .map_err(|e| CareFinderError::geocode(address, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CareFinderError::geocode(
                address,
                format!("provider responded with HTTP {status}"),
            ));
        }

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            CareFinderError::geocode(address, format!("invalid provider response: {e}"))
        })?;

        let candidates = candidates_from_response(address, body)?;

        let elapsed = start_time.elapsed();
        info!(
            "Found {} geocoding candidates in {:.3}s",
            candidates.len(),
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow geocoding response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(candidates)
    }
}

fn candidates_from_response(address: &str, body: GeocodeResponse) -> Result<Vec<GeocodeCandidate>> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => {
            debug!("Provider returned ZERO_RESULTS");
            return Ok(Vec::new());
        }
        other => {
            let detail = body.error_message.unwrap_or_default();
            return Err(CareFinderError::geocode(
                address,
                format!("provider status {other} {detail}").trim_end().to_string(),
            ));
        }
    }

    Ok(body
        .results
        .into_iter()
        .map(|result| GeocodeCandidate {
            formatted_address: result.formatted_address,
            location: GeoCoordinate::new(result.geometry.location.lat, result.geometry.location.lng),
        })
        .collect())
}
