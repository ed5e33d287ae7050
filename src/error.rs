//! Error types and handling for the CareFinder skill

use thiserror::Error;

use crate::messages;

/// Main error type for the CareFinder skill
#[derive(Error, Debug)]
pub enum CareFinderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The user has not granted (or has revoked) address permission
    #[error("Missing permission: {message}")]
    MissingPermission { message: String },

    /// The device has no address set
    #[error("No address set for device")]
    NoAddress,

    /// The device address lacks the fields needed for geocoding
    #[error("Incomplete device address: {message}")]
    IncompleteAddress { message: String },

    /// Device Address API failure (transport or unexpected status)
    #[error("Device address API error: {message}")]
    AddressApi { message: String },

    /// Geocoding returned no candidates or failed in transport
    #[error("Geocoding failed for '{address}': {message}")]
    Geocode { address: String, message: String },

    /// Facility feed could not be retrieved
    #[error("Facility feed unavailable: {message}")]
    FeedUnavailable { message: String },

    /// Facility feed body was not the expected JSON envelope
    #[error("Facility feed parse error: {message}")]
    FeedParse { message: String },

    /// Ranking produced no candidates
    #[error("No facilities available to rank")]
    EmptyFeed,

    /// A facility carried coordinates that are not finite numbers
    #[error("Invalid coordinates for '{facility}': {message}")]
    InvalidCoordinate { facility: String, message: String },

    /// The skill request was addressed elsewhere or failed verification
    #[error("Invalid skill request: {message}")]
    InvalidRequest { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// How the skill answers a failed turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureResponse {
    /// Speak the message and attach an address-permission consent card
    PermissionCard,
    /// Speak the message and end the session politely
    Tell,
    /// Speak the generic apology and end the session
    Apology,
}

impl CareFinderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new missing-permission error
    pub fn missing_permission<S: Into<String>>(message: S) -> Self {
        Self::MissingPermission {
            message: message.into(),
        }
    }

    /// Create a new incomplete-address error
    pub fn incomplete_address<S: Into<String>>(message: S) -> Self {
        Self::IncompleteAddress {
            message: message.into(),
        }
    }

    /// Create a new Device Address API error
    pub fn address_api<S: Into<String>>(message: S) -> Self {
        Self::AddressApi {
            message: message.into(),
        }
    }

    /// Create a new geocoding error for the given address
    pub fn geocode<A: Into<String>, S: Into<String>>(address: A, message: S) -> Self {
        Self::Geocode {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new feed-unavailable error
    pub fn feed_unavailable<S: Into<String>>(message: S) -> Self {
        Self::FeedUnavailable {
            message: message.into(),
        }
    }

    /// Create a new feed parse error
    pub fn feed_parse<S: Into<String>>(message: S) -> Self {
        Self::FeedParse {
            message: message.into(),
        }
    }

    /// Create a new invalid-request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new invalid-coordinate error for the given facility
    pub fn invalid_coordinate<F: Into<String>, S: Into<String>>(facility: F, message: S) -> Self {
        Self::InvalidCoordinate {
            facility: facility.into(),
            message: message.into(),
        }
    }

    /// Response category used when this error ends a turn
    #[must_use]
    pub fn failure_response(&self) -> FailureResponse {
        match self {
            CareFinderError::MissingPermission { .. } => FailureResponse::PermissionCard,
            CareFinderError::NoAddress
            | CareFinderError::IncompleteAddress { .. }
            | CareFinderError::Geocode { .. }
            | CareFinderError::EmptyFeed
            | CareFinderError::InvalidCoordinate { .. } => FailureResponse::Tell,
            CareFinderError::Config { .. }
            | CareFinderError::AddressApi { .. }
            | CareFinderError::FeedUnavailable { .. }
            | CareFinderError::FeedParse { .. }
            | CareFinderError::InvalidRequest { .. }
            | CareFinderError::Io { .. } => FailureResponse::Apology,
        }
    }

    /// Get the spoken message for this error
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            CareFinderError::MissingPermission { .. } => messages::NOTIFY_MISSING_PERMISSIONS,
            CareFinderError::NoAddress => messages::NO_ADDRESS,
            CareFinderError::IncompleteAddress { .. } => messages::NO_FULL_ADDRESS,
            CareFinderError::Geocode { .. } => messages::GEOCODE_FAILURE,
            CareFinderError::EmptyFeed | CareFinderError::InvalidCoordinate { .. } => {
                messages::NO_FACILITIES
            }
            CareFinderError::AddressApi { .. } => messages::LOCATION_FAILURE,
            CareFinderError::Config { .. }
            | CareFinderError::FeedUnavailable { .. }
            | CareFinderError::FeedParse { .. }
            | CareFinderError::InvalidRequest { .. }
            | CareFinderError::Io { .. } => messages::ERROR,
        }
    }
}
