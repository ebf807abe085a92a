use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Geographic identity of a grid cell, unique across a dataset.
///
/// Equality and hashing use the exact bit pattern of both coordinates so the
/// key can index hash maps; `-0.0` is folded into `0.0` on construction.
/// Serialized as the string `"<longitude>,<latitude>"` so it can be used as a
/// JSON object key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteKey {
    /// Longitude in decimal degrees (-180 to 180)
    pub longitude: f64,
    /// Latitude in decimal degrees (-90 to 90)
    pub latitude: f64,
}

impl SiteKey {
    /// Create a new site key with validation
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, String> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!(
                "Invalid longitude: {}. Must be between -180 and 180",
                longitude
            ));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!(
                "Invalid latitude: {}. Must be between -90 and 90",
                latitude
            ));
        }

        Ok(SiteKey {
            longitude: longitude + 0.0,
            latitude: latitude + 0.0,
        })
    }

    fn bits(&self) -> (u64, u64) {
        (self.longitude.to_bits(), self.latitude.to_bits())
    }
}

impl PartialEq for SiteKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for SiteKey {}

impl Hash for SiteKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for SiteKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SiteKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.longitude
            .total_cmp(&other.longitude)
            .then_with(|| self.latitude.total_cmp(&other.latitude))
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

impl FromStr for SiteKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lon, lat) = s
            .split_once(',')
            .ok_or_else(|| format!("Invalid site key '{}': expected '<lon>,<lat>'", s))?;
        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid longitude in site key '{}': {}", s, e))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid latitude in site key '{}': {}", s, e))?;
        SiteKey::new(longitude, latitude)
    }
}

impl TryFrom<String> for SiteKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteKey> for String {
    fn from(key: SiteKey) -> Self {
        key.to_string()
    }
}
