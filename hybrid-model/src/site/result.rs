use serde::{Deserialize, Serialize};

use super::Site;

/// Capacities chosen for one site.
///
/// An unresolved site carries [`CapacityMix::INFEASIBLE_SENTINEL`] in every field,
/// which is distinct from a genuine zero-capacity solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityMix {
    /// Installed solar capacity (MW)
    pub pv_capacity_mw: f64,
    /// Installed wind capacity (MW)
    pub wind_capacity_mw: f64,
    /// Storage power capacity (MW); energy capacity follows from the duration ratio
    pub storage_power_mw: f64,
}

impl CapacityMix {
    pub const INFEASIBLE_SENTINEL: f64 = -1.0;

    pub fn infeasible() -> Self {
        Self {
            pv_capacity_mw: Self::INFEASIBLE_SENTINEL,
            wind_capacity_mw: Self::INFEASIBLE_SENTINEL,
            storage_power_mw: Self::INFEASIBLE_SENTINEL,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        self.pv_capacity_mw == Self::INFEASIBLE_SENTINEL
            && self.wind_capacity_mw == Self::INFEASIBLE_SENTINEL
            && self.storage_power_mw == Self::INFEASIBLE_SENTINEL
    }
}

/// Hourly trajectories of a feasible solve, one value per hour of the horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyBundle {
    pub storage_charge: Vec<f64>,
    pub storage_discharge: Vec<f64>,
    pub storage_energy: Vec<f64>,
    pub pv_dispatch: Vec<f64>,
    pub wind_dispatch: Vec<f64>,
}

impl HourlyBundle {
    /// Number of hours covered by the bundle
    pub fn len(&self) -> usize {
        self.storage_energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage_energy.is_empty()
    }

    /// Largest absolute deviation of `pv + wind + discharge - charge` from the firm load
    pub fn max_balance_residual(&self, target_load: f64) -> f64 {
        (0..self.len())
            .map(|t| {
                (self.pv_dispatch[t] + self.wind_dispatch[t] + self.storage_discharge[t]
                    - self.storage_charge[t]
                    - target_load)
                    .abs()
            })
            .fold(0.0, f64::max)
    }

    /// Largest absolute violation of the cyclic storage balance.
    ///
    /// Hour 0 is compared against the last hour of the horizon.
    pub fn max_cyclic_storage_residual(
        &self,
        charge_efficiency: f64,
        inv_discharge_efficiency: f64,
    ) -> f64 {
        let horizon = self.len();
        (0..horizon)
            .map(|t| {
                let prev = (t + horizon - 1) % horizon;
                (self.storage_energy[t]
                    - self.storage_energy[prev]
                    - charge_efficiency * self.storage_charge[t]
                    + inv_discharge_efficiency * self.storage_discharge[t])
                    .abs()
            })
            .fold(0.0, f64::max)
    }

    /// Peak state of charge over the horizon
    pub fn max_storage_energy(&self) -> f64 {
        self.storage_energy.iter().copied().fold(0.0, f64::max)
    }
}

/// One row of a shard's tabular output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub longitude: f64,
    pub latitude: f64,
    /// Solar potential (MW)
    pub pv_potential: f64,
    /// Wind potential (MW)
    pub wind_potential: f64,
    pub wind_capacity: f64,
    pub pv_capacity: f64,
    pub storage_capacity: f64,
}

impl SiteRecord {
    pub fn new(site: &Site, capacity: &CapacityMix) -> Self {
        Self {
            longitude: site.key.longitude,
            latitude: site.key.latitude,
            pv_potential: site.solar_potential_mw,
            wind_potential: site.wind_potential_mw,
            wind_capacity: capacity.wind_capacity_mw,
            pv_capacity: capacity.pv_capacity_mw,
            storage_capacity: capacity.storage_power_mw,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        self.capacity().is_infeasible()
    }

    pub fn capacity(&self) -> CapacityMix {
        CapacityMix {
            pv_capacity_mw: self.pv_capacity,
            wind_capacity_mw: self.wind_capacity,
            storage_power_mw: self.storage_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::location::SiteKey;

    fn flat_bundle(hours: usize) -> HourlyBundle {
        HourlyBundle {
            storage_charge: vec![0.0; hours],
            storage_discharge: vec![0.0; hours],
            storage_energy: vec![0.0; hours],
            pv_dispatch: vec![1.0; hours],
            wind_dispatch: vec![0.0; hours],
        }
    }

    #[test]
    fn test_infeasible_sentinel() {
        let mix = CapacityMix::infeasible();
        assert!(mix.is_infeasible());
        assert_eq!(mix.pv_capacity_mw, -1.0);

        let zero = CapacityMix {
            pv_capacity_mw: 0.0,
            wind_capacity_mw: 0.0,
            storage_power_mw: 0.0,
        };
        assert!(!zero.is_infeasible());
    }

    #[test]
    fn test_balance_residual() {
        let mut bundle = flat_bundle(4);
        assert_eq!(bundle.max_balance_residual(1.0), 0.0);

        bundle.wind_dispatch[2] = 0.25;
        assert!((bundle.max_balance_residual(1.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cyclic_residual_wraps_year_boundary() {
        let mut bundle = flat_bundle(3);
        // charge at hour 1, discharge at hour 0 which reads its predecessor from hour 2
        bundle.storage_charge[1] = 1.0;
        bundle.storage_energy = vec![0.0, 0.5, 0.5];
        bundle.storage_discharge[0] = 0.25;
        assert!(bundle.max_cyclic_storage_residual(0.5, 2.0) < 1e-12);

        bundle.storage_energy[2] = 0.4;
        assert!((bundle.max_cyclic_storage_residual(0.5, 2.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_record_from_site() {
        let site = Site::new(SiteKey::new(30.0, 25.0).unwrap(), 5000.0, 2000.0).unwrap();
        let record = SiteRecord::new(&site, &CapacityMix::infeasible());
        assert!(record.is_infeasible());
        assert_eq!(record.pv_potential, 5000.0);
        assert_eq!(record.wind_potential, 2000.0);
        assert_eq!(record.longitude, 30.0);
    }
}
