pub mod capacity;
pub mod config;
pub mod general;
pub mod io;
pub mod shard;

// Re-export commonly used items for convenience
pub use capacity::{SiteOutcome, SizingConfig, SizingError, SolverBackend, optimize};
pub use config::{AppConfig, RunConfig};
pub use general::profiles::ResourceProfiles;
pub use shard::{ShardResult, merge_shards, run_all_shards, run_shard};
