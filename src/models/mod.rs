//! Data models for the CareFinder skill
//!
//! This module contains the core domain models organized by concern:
//! - Location: Coordinates and the user's resolved address
//! - Facility: ER records from the feed and their ranked view
//! - Session: Typed conversational state

pub mod facility;
pub mod location;
pub mod session;

// Re-export all public types for convenient access
pub use facility::{FacilityRecord, RankedFacility, RankedFeed};
pub use location::{AddressContext, GeoCoordinate};
pub use session::SessionState;
