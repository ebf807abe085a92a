//! Persistence of shard results.
//!
//! Each shard writes three files into the output directory:
//! `sites_<id>.csv` (one row per site, sentinel -1 for unresolved sites),
//! `hourly_<id>.json` (site key to hourly bundle, feasible sites only) and
//! `summary_<id>.json`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use hybrid_model::{HourlyBundle, SiteKey, SiteRecord};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::capacity::error::{SizingError, SizingResult};
use crate::shard::merge::{MergedResults, merge_shards};
use crate::shard::partition::Shard;
use crate::shard::runner::{ShardResult, ShardSummary};

pub fn records_path(dir: &Path, shard_id: usize) -> PathBuf {
    dir.join(format!("sites_{shard_id}.csv"))
}

pub fn hourly_path(dir: &Path, shard_id: usize) -> PathBuf {
    dir.join(format!("hourly_{shard_id}.json"))
}

pub fn summary_path(dir: &Path, shard_id: usize) -> PathBuf {
    dir.join(format!("summary_{shard_id}.json"))
}

/// Writes site rows as CSV to any writer
pub fn write_records(records: &[SiteRecord], writer: impl Write) -> SizingResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_records(reader: impl Read) -> SizingResult<Vec<SiteRecord>> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let records = rdr.deserialize().collect::<Result<Vec<SiteRecord>, _>>()?;
    Ok(records)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> SizingResult<()> {
    let mut buf = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut buf, value)?;
    buf.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> SizingResult<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Writes all output files of one shard, creating the directory if needed
pub fn export_shard(dir: &Path, result: &ShardResult) -> SizingResult<()> {
    fs::create_dir_all(dir)?;
    let id = result.shard.id;

    let file = File::create(records_path(dir, id))?;
    write_records(&result.records, BufWriter::new(file))?;
    write_json(&hourly_path(dir, id), &result.hourly)?;
    write_json(&summary_path(dir, id), &result.summary())?;
    Ok(())
}

/// Reads one shard back from its output files
pub fn import_shard(dir: &Path, shard_id: usize) -> SizingResult<ShardResult> {
    let summary: ShardSummary = read_json(&summary_path(dir, shard_id))?;
    if summary.shard_id != shard_id {
        return Err(SizingError::InvalidInput(format!(
            "{} belongs to shard {}",
            summary_path(dir, shard_id).display(),
            summary.shard_id
        )));
    }
    let shard = Shard::new(summary.shard_id, summary.shard_count)?;

    let file = File::open(records_path(dir, shard_id))?;
    let records = read_records(BufReader::new(file))?;
    let hourly: IndexMap<SiteKey, HourlyBundle> = read_json(&hourly_path(dir, shard_id))?;

    if records.len() != summary.sites {
        return Err(SizingError::InvalidInput(format!(
            "shard {} lists {} sites but its table has {} rows",
            shard_id,
            summary.sites,
            records.len()
        )));
    }

    Ok(ShardResult {
        shard,
        site_range: summary.first_site..summary.first_site + summary.sites,
        records,
        hourly,
        invalid_count: summary.invalid_count,
    })
}

/// Reads shards `0..shard_count` from `dir` and merges them.
///
/// Every shard file must have been written by a run split into `shard_count`
/// shards.
pub fn merge_output_dir(dir: &Path, shard_count: usize) -> SizingResult<MergedResults> {
    if shard_count == 0 {
        return Err(SizingError::PartitionBounds {
            shard_id: 0,
            shard_count,
        });
    }
    let shards = (0..shard_count)
        .map(|id| {
            let result = import_shard(dir, id)?;
            if result.shard.count != shard_count {
                return Err(SizingError::InvalidInput(format!(
                    "{} was written by a run of {} shards, expected {}",
                    summary_path(dir, id).display(),
                    result.shard.count,
                    shard_count
                )));
            }
            Ok(result)
        })
        .collect::<SizingResult<Vec<_>>>()?;
    merge_shards(shards)
}

/// Totals of a merged run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub shards: usize,
    pub sites: usize,
    pub solved: usize,
    pub invalid_count: usize,
}

impl From<&MergedResults> for RunSummary {
    fn from(merged: &MergedResults) -> Self {
        Self {
            shards: merged.summaries.len(),
            sites: merged.records.len(),
            solved: merged.hourly.len(),
            invalid_count: merged.invalid_count,
        }
    }
}

/// Writes `sites.csv` and `summary.json` for a merged run
pub fn export_merged(dir: &Path, merged: &MergedResults) -> SizingResult<RunSummary> {
    fs::create_dir_all(dir)?;
    let file = File::create(dir.join("sites.csv"))?;
    write_records(&merged.records, BufWriter::new(file))?;

    let summary = RunSummary::from(merged);
    write_json(&dir.join("summary.json"), &summary)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::runner::run_shard;
    use crate::shard::runner::tests::{StubOptimizer, grid};

    #[test]
    fn test_records_csv_layout() {
        let (sites, profiles) = grid(3, 2);
        let result = run_shard(0, 1, &sites, &profiles, &StubOptimizer { horizon: 2 }).unwrap();

        let mut buf = Vec::new();
        write_records(&result.records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(concat!(
                "longitude,latitude,pv_potential,wind_potential,",
                "wind_capacity,pv_capacity,storage_capacity"
            ))
        );
        // the third site has no sun
        let third = lines.nth(2).unwrap();
        assert!(third.ends_with(",-1.0,-1.0,-1.0"), "got {third}");
    }

    #[test]
    fn test_export_then_merge_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (sites, profiles) = grid(10, 3);
        let optimizer = StubOptimizer { horizon: 3 };

        for id in [2, 0, 1] {
            let result = run_shard(id, 3, &sites, &profiles, &optimizer).unwrap();
            export_shard(dir.path(), &result).unwrap();
        }
        assert!(records_path(dir.path(), 1).exists());

        let imported = import_shard(dir.path(), 1).unwrap();
        let fresh = run_shard(1, 3, &sites, &profiles, &optimizer).unwrap();
        assert_eq!(imported, fresh);

        let merged = merge_output_dir(dir.path(), 3).unwrap();
        assert_eq!(merged.records.len(), 10);
        assert_eq!(merged.invalid_count, 3);

        let summary = export_merged(dir.path(), &merged).unwrap();
        assert_eq!(summary.sites, 10);
        assert_eq!(summary.solved, 7);
        assert!(dir.path().join("sites.csv").exists());
    }

    #[test]
    fn test_hourly_values_survive_export_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let (sites, profiles) = grid(2, 4);
        let mut result = run_shard(0, 1, &sites, &profiles, &StubOptimizer { horizon: 4 }).unwrap();
        let awkward = [0.1 + 0.2, 1.0 / 3.0, 2.0 / 7.0 * 1e-5, 123456.789012345678];
        for bundle in result.hourly.values_mut() {
            bundle.storage_energy = awkward.to_vec();
            bundle.storage_discharge = awkward.iter().map(|v| v * std::f64::consts::E).collect();
        }

        export_shard(dir.path(), &result).unwrap();
        let imported = import_shard(dir.path(), 0).unwrap();

        for (key, bundle) in &result.hourly {
            let restored = &imported.hourly[key];
            for (a, b) in bundle.storage_energy.iter().zip(&restored.storage_energy) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
            for (a, b) in bundle.storage_discharge.iter().zip(&restored.storage_discharge) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
        assert_eq!(imported, result);
    }

    #[test]
    fn test_merge_with_wrong_shard_count_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (sites, profiles) = grid(20, 2);
        let optimizer = StubOptimizer { horizon: 2 };
        for id in 0..4 {
            let result = run_shard(id, 4, &sites, &profiles, &optimizer).unwrap();
            export_shard(dir.path(), &result).unwrap();
        }

        assert!(matches!(
            merge_output_dir(dir.path(), 2),
            Err(SizingError::InvalidInput(_))
        ));
        assert_eq!(merge_output_dir(dir.path(), 4).unwrap().records.len(), 20);
    }

    #[test]
    fn test_missing_shard_fails_merge() {
        let dir = tempfile::tempdir().unwrap();
        let (sites, profiles) = grid(4, 2);
        let result = run_shard(0, 2, &sites, &profiles, &StubOptimizer { horizon: 2 }).unwrap();
        export_shard(dir.path(), &result).unwrap();

        assert!(matches!(
            merge_output_dir(dir.path(), 2),
            Err(SizingError::Io(_))
        ));
    }
}
