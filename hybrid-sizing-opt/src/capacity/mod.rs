pub mod capacity_opt;
pub mod config;
pub mod error;

pub use capacity_opt::{OptimalSizing, SiteOutcome, optimize};
pub use config::{HOURS_PER_YEAR, SizingConfig, SolverBackend};
pub use error::{SizingError, SizingResult};
