use std::collections::HashSet;

use hybrid_model::{HourlyBundle, SiteKey, SiteRecord};
use indexmap::IndexMap;

use crate::capacity::error::{SizingError, SizingResult};
use crate::shard::runner::{ShardResult, ShardSummary};

/// Results of a whole run, reassembled from its shards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedResults {
    /// All rows, in input site order
    pub records: Vec<SiteRecord>,
    pub hourly: IndexMap<SiteKey, HourlyBundle>,
    pub summaries: Vec<ShardSummary>,
    pub invalid_count: usize,
}

/// Reassembles shard results regardless of the order they completed in.
///
/// Shards are ordered by id, so the concatenated rows follow the input table.
/// All shards must come from the same run and cover ids `0..shard_count`
/// exactly. A site key seen twice, or a shard id seen twice, is an error.
pub fn merge_shards(mut shards: Vec<ShardResult>) -> SizingResult<MergedResults> {
    shards.sort_by_key(|result| result.shard.id);
    if let Some(pair) = shards.windows(2).find(|w| w[0].shard.id == w[1].shard.id) {
        return Err(SizingError::InvalidInput(format!(
            "shard {} was given more than once",
            pair[0].shard.id
        )));
    }
    check_complete_run(&shards)?;

    let mut merged = MergedResults::default();
    let mut seen = HashSet::new();
    for shard in shards {
        merged.summaries.push(shard.summary());
        merged.invalid_count += shard.invalid_count;
        for record in shard.records {
            let key = SiteKey::new(record.longitude, record.latitude)
                .map_err(SizingError::InvalidInput)?;
            if !seen.insert(key) {
                return Err(SizingError::DuplicateSite(key));
            }
            merged.records.push(record);
        }
        merged.hourly.extend(shard.hourly);
    }
    Ok(merged)
}

/// Every shard must share one shard count and the ids must be `0..count`
fn check_complete_run(shards: &[ShardResult]) -> SizingResult<()> {
    let Some(first) = shards.first() else {
        return Err(SizingError::InvalidInput("no shards to merge".to_string()));
    };
    let count = first.shard.count;
    if let Some(other) = shards.iter().find(|result| result.shard.count != count) {
        return Err(SizingError::InvalidInput(format!(
            "shard {} belongs to a run of {} shards, expected {}",
            other.shard.id, other.shard.count, count
        )));
    }
    if shards.len() != count {
        let missing: Vec<usize> = (0..count)
            .filter(|id| !shards.iter().any(|result| result.shard.id == *id))
            .collect();
        return Err(SizingError::InvalidInput(format!(
            "run of {} shards is incomplete, missing {:?}",
            count, missing
        )));
    }
    Ok(())
}
