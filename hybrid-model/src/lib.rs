//! Shared data structs for hybrid solar, wind and storage sizing.

pub mod general;
pub mod site;

pub use general::location::SiteKey;
pub use site::result::{CapacityMix, HourlyBundle, SiteRecord};
pub use site::{Resource, Site};
