//! `CareFinder` - voice skill backend that finds the closest emergency room
//!
//! This library resolves the user's device address to coordinates, reads the
//! live ER wait-time feed, ranks facilities by great-circle distance and
//! turns the nearest one into a spoken answer.

pub mod config;
pub mod device_address;
pub mod distance;
pub mod error;
pub mod feed;
pub mod finder;
pub mod geocoding;
pub mod location_resolver;
pub mod messages;
pub mod models;
pub mod ranking;
pub mod skill;
pub mod speech;
pub mod web;

// Re-export core types for public API
pub use config::CareFinderConfig;
pub use device_address::{DeviceAddressClient, DeviceAddressLookup};
pub use error::{CareFinderError, FailureResponse};
pub use feed::{ErWaitFeedClient, FacilityFeed};
pub use finder::ClosestErService;
pub use geocoding::{GeocodingProvider, GoogleGeocodingClient};
pub use location_resolver::LocationResolver;
pub use models::{AddressContext, FacilityRecord, GeoCoordinate, RankedFacility, RankedFeed};
pub use skill::{RequestEnvelope, ResponseEnvelope, SkillHandler};
pub use speech::SpeechResult;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CareFinderError>;
