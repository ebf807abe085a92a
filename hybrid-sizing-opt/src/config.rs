use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capacity::config::SizingConfig;
use crate::capacity::error::{SizingError, SizingResult};

/// Default number of shards a site table is split into
pub const DEFAULT_SHARD_COUNT: usize = 10;

/// Worker-level settings: where inputs live, where results go, how the run is split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub shard_count: usize,
    pub site_table: PathBuf,     // CSV: lon,lat,pv_potential,wind_potential
    pub solar_profiles: PathBuf, // JSON: "lon,lat" -> hourly capacity factors
    pub wind_profiles: PathBuf,  // JSON: "lon,lat" -> hourly capacity factors
    pub output_dir: PathBuf,
    pub potential_scale: f64, // Site table potentials are GW, the model works in MW
    pub threads: usize,       // Pool size for running all shards locally (0 = auto)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            site_table: PathBuf::from("data/sites.csv"),
            solar_profiles: PathBuf::from("data/solar_cf.json"),
            wind_profiles: PathBuf::from("data/wind_cf.json"),
            output_dir: PathBuf::from("results/shards"),
            potential_scale: 1000.0,
            threads: 0,
        }
    }
}

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub sizing: SizingConfig,
    pub run: RunConfig,
}

impl AppConfig {
    /// Parses a configuration from a TOML string and validates it
    pub fn from_toml_str(s: &str) -> SizingResult<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SizingResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> SizingResult<()> {
        self.sizing.validate()?;
        if self.run.shard_count == 0 {
            return Err(SizingError::InvalidConfig(
                "run.shard_count must be > 0".to_string(),
            ));
        }
        if !(self.run.potential_scale.is_finite() && self.run.potential_scale > 0.0) {
            return Err(SizingError::InvalidConfig(format!(
                "run.potential_scale must be > 0, got {}",
                self.run.potential_scale
            )));
        }
        Ok(())
    }
}
