use std::ops::Range;

use hybrid_model::{HourlyBundle, Site, SiteKey, SiteRecord};
use indexmap::IndexMap;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capacity::capacity_opt::{SiteOutcome, optimize};
use crate::capacity::config::SizingConfig;
use crate::capacity::error::{SizingError, SizingResult};
use crate::general::profiles::ResourceProfiles;
use crate::shard::partition::Shard;

/// Solves the capacity model for a single site.
///
/// [`SizingConfig`] is the LP implementation; the trait lets the shard driver
/// run against anything that maps a site and its profiles to an outcome.
pub trait SiteOptimizer: Sync {
    /// Number of hours each profile must cover
    fn horizon_hours(&self) -> usize;

    fn optimize_site(
        &self,
        site: &Site,
        pv_cf: &[f64],
        wind_cf: &[f64],
    ) -> SizingResult<SiteOutcome>;
}

impl SiteOptimizer for SizingConfig {
    fn horizon_hours(&self) -> usize {
        self.horizon_hours
    }

    fn optimize_site(
        &self,
        site: &Site,
        pv_cf: &[f64],
        wind_cf: &[f64],
    ) -> SizingResult<SiteOutcome> {
        optimize(site, pv_cf, wind_cf, self)
    }
}

/// Everything one shard produced; written once and never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct ShardResult {
    pub shard: Shard,
    /// Index range of the shard in the full site table
    pub site_range: Range<usize>,
    /// One row per site, in input order; infeasible sites carry the sentinel
    pub records: Vec<SiteRecord>,
    /// Hourly trajectories of the feasible sites only
    pub hourly: IndexMap<SiteKey, HourlyBundle>,
    pub invalid_count: usize,
}

/// Per-shard counts that are logged and persisted next to the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSummary {
    pub shard_id: usize,
    pub shard_count: usize,
    pub first_site: usize,
    pub sites: usize,
    pub solved: usize,
    pub invalid_count: usize,
}

impl ShardResult {
    pub fn summary(&self) -> ShardSummary {
        ShardSummary {
            shard_id: self.shard.id,
            shard_count: self.shard.count,
            first_site: self.site_range.start,
            sites: self.records.len(),
            solved: self.hourly.len(),
            invalid_count: self.invalid_count,
        }
    }
}

/// Runs the optimizer over every site of one shard, in input order.
///
/// The shard id is checked and all profiles of the shard are validated before
/// the first solve. Infeasible sites are counted and kept as sentinel rows;
/// malformed or missing profiles abort the shard. The result depends only on
/// the arguments, so re-running a shard reproduces it.
pub fn run_shard<O: SiteOptimizer>(
    shard_id: usize,
    shard_count: usize,
    sites: &[Site],
    profiles: &ResourceProfiles,
    optimizer: &O,
) -> SizingResult<ShardResult> {
    let shard = Shard::new(shard_id, shard_count)?;
    let site_range = shard.site_range(sites.len());
    let shard_sites = &sites[site_range.clone()];

    let horizon = optimizer.horizon_hours();
    let inputs = shard_sites
        .iter()
        .map(|site| {
            profiles
                .site_profiles(&site.key, horizon)
                .map(|(pv_cf, wind_cf)| (site, pv_cf, wind_cf))
        })
        .collect::<SizingResult<Vec<_>>>()?;

    info!(
        shard = shard.id,
        shard_count = shard.count,
        first_site = site_range.start,
        sites = shard_sites.len(),
        "starting shard"
    );

    let mut records = Vec::with_capacity(inputs.len());
    let mut hourly = IndexMap::with_capacity(inputs.len());
    let mut invalid_count = 0;

    for (site, pv_cf, wind_cf) in inputs {
        let outcome = optimizer.optimize_site(site, pv_cf, wind_cf)?;
        records.push(SiteRecord::new(site, &outcome.capacity()));

        match outcome {
            SiteOutcome::Optimal(sizing) => {
                if hourly.insert(site.key, sizing.hourly).is_some() {
                    return Err(SizingError::DuplicateSite(site.key));
                }
            }
            SiteOutcome::Infeasible { reason } => {
                invalid_count += 1;
                warn!(
                    shard = shard.id,
                    site = %site.key,
                    %reason,
                    "no optimal sizing, site skipped"
                );
            }
        }
    }

    let result = ShardResult {
        shard,
        site_range,
        records,
        hourly,
        invalid_count,
    };
    let summary = result.summary();
    info!(
        shard = summary.shard_id,
        sites = summary.sites,
        solved = summary.solved,
        invalid = summary.invalid_count,
        "shard finished"
    );
    Ok(result)
}

/// Runs every shard of a run on a local rayon pool and returns them in shard order.
///
/// Sites inside a shard stay sequential. `threads == 0` lets rayon pick the
/// pool size.
pub fn run_all_shards<O: SiteOptimizer>(
    shard_count: usize,
    sites: &[Site],
    profiles: &ResourceProfiles,
    optimizer: &O,
    threads: usize,
) -> SizingResult<Vec<ShardResult>> {
    if shard_count == 0 {
        return Err(SizingError::PartitionBounds {
            shard_id: 0,
            shard_count,
        });
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SizingError::InvalidConfig(format!("building rayon thread pool: {e}")))?;

    pool.install(|| {
        (0..shard_count)
            .into_par_iter()
            .map(|shard_id| run_shard(shard_id, shard_count, sites, profiles, optimizer))
            .collect()
    })
}
