//! Client for the Alexa Device Address API
//!
//! Reads the address a user configured for their device. Every call needs
//! the consent token the user granted to the skill.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::DeviceAddressConfig;
use crate::{CareFinderError, Result};

/// Permission scope for the full device address
pub const ALL_ADDRESS_PERMISSION: &str = "read::alexa:device:all:address";

/// Full address as returned by the Device Address API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAddress {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub district_or_county: Option<String>,
    pub state_or_region: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
}

impl DeviceAddress {
    /// Address text for geocoding: `"{line1}, {state}, {postal}"`.
    ///
    /// Fails with `IncompleteAddress` when the street line or the state is
    /// missing.
    pub fn to_query(&self) -> Result<String> {
        let line1 = non_empty(&self.address_line1)
            .ok_or_else(|| CareFinderError::incomplete_address("addressLine1 is missing"))?;
        let state = non_empty(&self.state_or_region)
            .ok_or_else(|| CareFinderError::incomplete_address("stateOrRegion is missing"))?;

        Ok(match non_empty(&self.postal_code) {
            Some(postal) => format!("{line1}, {state}, {postal}"),
            None => format!("{line1}, {state}"),
        })
    }
}

/// Country and postal code subset of the device address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryAndPostalCode {
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Where and as whom to ask for the device address
#[derive(Debug, Clone)]
pub struct DeviceAddressRequest<'a> {
    /// Base API endpoint from the request context, e.g. `https://api.amazonalexa.com`
    pub api_endpoint: &'a str,
    pub device_id: &'a str,
    pub consent_token: &'a str,
}

/// Anything that can look up a device's address
#[async_trait]
pub trait DeviceAddressLookup: Send + Sync {
    async fn full_address(&self, request: &DeviceAddressRequest<'_>) -> Result<DeviceAddress>;
}

/// HTTP client for the Device Address API
pub struct DeviceAddressClient {
    client: Client,
}

impl DeviceAddressClient {
    /// Create a new client
    pub fn new(config: &DeviceAddressConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("CareFinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CareFinderError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Retrieve only the country and postal code of the device
    #[instrument(skip(self, request), fields(device_id = request.device_id))]
    pub async fn country_and_postal_code(
        &self,
        request: &DeviceAddressRequest<'_>,
    ) -> Result<CountryAndPostalCode> {
        self.get_json(request, "/settings/address/countryAndPostalCode")
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: &DeviceAddressRequest<'_>,
        suffix: &str,
    ) -> Result<T> {
        let url = format!(
            "{}/v1/devices/{}{}",
            request.api_endpoint.trim_end_matches('/'),
            urlencoding::encode(request.device_id),
            suffix
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(request.consent_token)
            .send()
            .await
            .map_err(|e| CareFinderError::address_api(format!("request failed: {e}")))?;

        let status = response.status();
        debug!(
            "Device Address API responded with a status code of: {}",
            status
        );

        match status {
            StatusCode::OK => response.json::<T>().await.map_err(|e| {
                CareFinderError::address_api(format!("invalid address payload: {e}"))
            }),
            StatusCode::NO_CONTENT => {
                info!("Device address API returned no address");
                Err(CareFinderError::NoAddress)
            }
            StatusCode::FORBIDDEN => {
                warn!("Consent token was not authorized to read the device address");
                Err(CareFinderError::missing_permission(
                    "consent token rejected by the Device Address API",
                ))
            }
            other => Err(CareFinderError::address_api(format!(
                "unexpected status {other}"
            ))),
        }
    }
}

#[async_trait]
impl DeviceAddressLookup for DeviceAddressClient {
    #[instrument(skip(self, request), fields(device_id = request.device_id))]
    async fn full_address(&self, request: &DeviceAddressRequest<'_>) -> Result<DeviceAddress> {
        self.get_json(request, "/settings/address").await
    }
}
