use serde::{Deserialize, Serialize};

use crate::capacity::error::{SizingError, SizingResult};
use crate::general::finance::{capital_recovery_factor, round_to};

/// Hours in a non-leap year
pub const HOURS_PER_YEAR: usize = 8760;

/// LP backend used for every site solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverBackend {
    /// HiGHS interior point, crossover disabled, logging off
    #[default]
    HighsIpm,
    /// Clarabel interior point (pure Rust), logging off
    Clarabel,
}

/// Configuration struct holding all sizing model parameters.
///
/// Passed by reference into each optimization so scenarios with different
/// assumptions can run side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    // Economic parameters
    pub wacc: f64,              // Discount rate used for the annuity weights
    pub life_pv_years: u32,     // Solar plant lifetime
    pub life_wind_years: u32,   // Wind plant lifetime
    pub life_storage_years: u32, // Storage lifetime

    // Storage parameters
    pub storage_duration_hours: f64, // Energy-to-power ratio of the storage
    pub charge_efficiency: f64,      // Fraction of charged energy that is stored
    pub discharge_efficiency: f64,   // Fraction of stored energy delivered on discharge

    // Load and reserve
    pub target_load: f64,      // Firm load to meet every hour (normalized)
    pub reserve_fraction: f64, // Reserve requirement as a fraction of the firm load

    // Solver parameters
    pub throughput_penalty: f64,         // Tie-breaker weight on storage charge + discharge
    pub horizon_hours: usize,            // Number of hours modelled (cyclic)
    pub enforce_potential_ceiling: bool, // if true, capacities cannot exceed site potentials
    pub backend: SolverBackend,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            wacc: 0.075,
            life_pv_years: 25,
            life_wind_years: 25,
            life_storage_years: 15,

            storage_duration_hours: 4.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,

            target_load: 1.0,
            reserve_fraction: 0.05,

            throughput_penalty: 1e-6,
            horizon_hours: HOURS_PER_YEAR,
            enforce_potential_ceiling: false,
            backend: SolverBackend::HighsIpm,
        }
    }
}

/// Objective weights derived from a [`SizingConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub pv: f64,
    pub wind: f64,
    pub storage: f64,
    pub throughput: f64,
}

impl SizingConfig {
    /// Reserve that must be held every hour
    pub fn reserve_requirement(&self) -> f64 {
        self.reserve_fraction * self.target_load
    }

    /// `1 / discharge_efficiency`, rounded to 8 decimals for solver stability
    pub fn inv_discharge_efficiency(&self) -> f64 {
        round_to(1.0 / self.discharge_efficiency, 8)
    }

    pub fn objective_weights(&self) -> ObjectiveWeights {
        ObjectiveWeights {
            pv: capital_recovery_factor(self.wacc, self.life_pv_years),
            wind: capital_recovery_factor(self.wacc, self.life_wind_years),
            storage: capital_recovery_factor(self.wacc, self.life_storage_years),
            throughput: self.throughput_penalty,
        }
    }

    /// Checks every parameter and reports the first invalid one
    pub fn validate(&self) -> SizingResult<()> {
        let invalid = |msg: String| Err(SizingError::InvalidConfig(msg));

        if !(self.wacc.is_finite() && self.wacc > 0.0) {
            return invalid(format!("wacc must be > 0, got {}", self.wacc));
        }
        for (name, years) in [
            ("life_pv_years", self.life_pv_years),
            ("life_wind_years", self.life_wind_years),
            ("life_storage_years", self.life_storage_years),
        ] {
            if years == 0 {
                return invalid(format!("{} must be > 0", name));
            }
        }
        for (name, eff) in [
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
        ] {
            if !(eff > 0.0 && eff <= 1.0) {
                return invalid(format!("{} must be in (0, 1], got {}", name, eff));
            }
        }
        if !(self.storage_duration_hours.is_finite() && self.storage_duration_hours > 0.0) {
            return invalid(format!(
                "storage_duration_hours must be > 0, got {}",
                self.storage_duration_hours
            ));
        }
        if !(self.target_load.is_finite() && self.target_load > 0.0) {
            return invalid(format!("target_load must be > 0, got {}", self.target_load));
        }
        if !(self.reserve_fraction.is_finite() && self.reserve_fraction >= 0.0) {
            return invalid(format!(
                "reserve_fraction must be >= 0, got {}",
                self.reserve_fraction
            ));
        }
        if !(self.throughput_penalty.is_finite() && self.throughput_penalty >= 0.0) {
            return invalid(format!(
                "throughput_penalty must be >= 0, got {}",
                self.throughput_penalty
            ));
        }
        if self.horizon_hours == 0 {
            return invalid("horizon_hours must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_config_default_values() {
        let config = SizingConfig::default();

        assert_eq!(config.wacc, 0.075);
        assert_eq!(config.storage_duration_hours, 4.0);
        assert_eq!(config.horizon_hours, 8760);
        assert_eq!(config.backend, SolverBackend::HighsIpm);
        assert!(!config.enforce_potential_ceiling);
        assert!((config.reserve_requirement() - 0.05).abs() < 1e-12);
        assert_eq!(config.inv_discharge_efficiency(), 1.05263158);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_objective_weights() {
        let weights = SizingConfig::default().objective_weights();
        assert_eq!(weights.pv, 0.089711);
        assert_eq!(weights.wind, 0.089711);
        assert_eq!(weights.storage, 0.113287);
        assert_eq!(weights.throughput, 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            SizingConfig {
                discharge_efficiency: 0.0,
                ..Default::default()
            },
            SizingConfig {
                charge_efficiency: 1.2,
                ..Default::default()
            },
            SizingConfig {
                horizon_hours: 0,
                ..Default::default()
            },
            SizingConfig {
                reserve_fraction: -0.1,
                ..Default::default()
            },
            SizingConfig {
                life_storage_years: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SizingError::InvalidConfig(_))),
                "expected rejection for {:?}",
                config
            );
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SizingConfig = toml::from_str(
            r#"
            reserve_fraction = 0.1
            backend = "clarabel"
            enforce_potential_ceiling = true
            "#,
        )
        .unwrap();

        assert_eq!(config.reserve_fraction, 0.1);
        assert_eq!(config.backend, SolverBackend::Clarabel);
        assert!(config.enforce_potential_ceiling);
        assert_eq!(config.life_storage_years, 15);
    }

    #[test]
    fn test_unknown_toml_field_is_rejected() {
        let result: Result<SizingConfig, _> = toml::from_str("storage_hours = 6.0");
        assert!(result.is_err());
    }
}
