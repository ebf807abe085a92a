pub mod merge;
pub mod partition;
pub mod runner;

pub use merge::{MergedResults, merge_shards};
pub use partition::{Shard, partition};
pub use runner::{ShardResult, ShardSummary, SiteOptimizer, run_all_shards, run_shard};
