pub mod result;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::general::location::SiteKey;

/// Renewable resource types with an hourly capacity-factor profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Solar,
    Wind,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Solar => "solar",
            Resource::Wind => "wind",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grid cell that can host solar, wind and storage capacity.
///
/// Read once from the input site table and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Unique identity of the cell
    pub key: SiteKey,
    /// Maximum installable solar capacity (MW)
    pub solar_potential_mw: f64,
    /// Maximum installable wind capacity (MW)
    pub wind_potential_mw: f64,
}

impl Site {
    /// Create a new site; potentials must be finite and non-negative
    pub fn new(
        key: SiteKey,
        solar_potential_mw: f64,
        wind_potential_mw: f64,
    ) -> Result<Self, String> {
        for (name, value) in [("solar", solar_potential_mw), ("wind", wind_potential_mw)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "Invalid {} potential {} at site {}. Must be a finite value >= 0",
                    name, value, key
                ));
            }
        }

        Ok(Site {
            key,
            solar_potential_mw,
            wind_potential_mw,
        })
    }

    pub fn potential_mw(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Solar => self.solar_potential_mw,
            Resource::Wind => self.wind_potential_mw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_rejects_negative_potential() {
        let key = SiteKey::new(10.0, 20.0).unwrap();
        assert!(Site::new(key, -1.0, 0.0).is_err());
        assert!(Site::new(key, 0.0, f64::INFINITY).is_err());

        let site = Site::new(key, 3.0, 4.5).unwrap();
        assert_eq!(site.potential_mw(Resource::Solar), 3.0);
        assert_eq!(site.potential_mw(Resource::Wind), 4.5);
    }
}
