pub mod sink;
pub mod sites;

pub use sink::{RunSummary, export_merged, export_shard, import_shard, merge_output_dir};
pub use sites::load_site_table;
