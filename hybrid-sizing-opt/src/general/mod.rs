pub mod finance;
pub mod profiles;

pub use finance::{capital_recovery_factor, round_to};
pub use profiles::{ProfileMap, ResourceProfiles};
