use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use hybrid_model::{Resource, SiteKey};
use indexmap::IndexMap;

use crate::capacity::error::{SizingError, SizingResult};

/// Hourly capacity factors keyed by site, in input order
pub type ProfileMap = IndexMap<SiteKey, Vec<f64>>;

/// Read-only solar and wind capacity-factor profiles for every site.
///
/// Shared by reference between shards; nothing mutates it after loading.
#[derive(Debug, Clone, Default)]
pub struct ResourceProfiles {
    pub solar: ProfileMap,
    pub wind: ProfileMap,
}

impl ResourceProfiles {
    pub fn new(solar: ProfileMap, wind: ProfileMap) -> Self {
        Self { solar, wind }
    }

    /// Raw profile for one site and resource
    pub fn get(&self, site: &SiteKey, resource: Resource) -> SizingResult<&[f64]> {
        let map = match resource {
            Resource::Solar => &self.solar,
            Resource::Wind => &self.wind,
        };
        map.get(site)
            .map(Vec::as_slice)
            .ok_or(SizingError::MissingProfile {
                site: *site,
                resource,
            })
    }

    /// Solar and wind profiles for a site, each checked and cut to `horizon` hours
    pub fn site_profiles(&self, site: &SiteKey, horizon: usize) -> SizingResult<(&[f64], &[f64])> {
        let solar = self.get(site, Resource::Solar)?;
        let wind = self.get(site, Resource::Wind)?;
        let solar = validate_profile(site, Resource::Solar, solar, horizon)?;
        let wind = validate_profile(site, Resource::Wind, wind, horizon)?;
        Ok((solar, wind))
    }
}

/// Checks that a profile covers the horizon and returns its first `horizon` hours.
///
/// Longer profiles are cut; shorter ones are rejected since padding would
/// corrupt the energy balance. Values inside the horizon must be finite and
/// non-negative.
pub fn validate_profile<'a>(
    site: &SiteKey,
    resource: Resource,
    profile: &'a [f64],
    horizon: usize,
) -> SizingResult<&'a [f64]> {
    if profile.len() < horizon {
        return Err(SizingError::MalformedProfile {
            site: *site,
            resource,
            len: profile.len(),
            expected: horizon,
        });
    }
    let profile = &profile[..horizon];
    if let Some(hour) = profile.iter().position(|v| !v.is_finite()) {
        return Err(SizingError::NonFiniteProfile {
            site: *site,
            resource,
            hour,
        });
    }
    if let Some(hour) = profile.iter().position(|&v| v < 0.0) {
        return Err(SizingError::NegativeProfile {
            site: *site,
            resource,
            hour,
            value: profile[hour],
        });
    }
    Ok(profile)
}

/// Loads a JSON object mapping `"lon,lat"` to an hourly capacity-factor array
pub fn load_profile_map(file_path: &Path) -> SizingResult<ProfileMap> {
    let file = File::open(file_path)?;
    read_profile_map(BufReader::new(file))
}

pub fn read_profile_map(reader: impl Read) -> SizingResult<ProfileMap> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(lon: f64, lat: f64) -> SiteKey {
        SiteKey::new(lon, lat).unwrap()
    }

    #[test]
    fn test_short_profile_is_rejected() {
        let profile = vec![0.5; 8759];
        let err = validate_profile(&key(1.0, 2.0), Resource::Solar, &profile, 8760).unwrap_err();
        match err {
            SizingError::MalformedProfile { len, expected, resource, .. } => {
                assert_eq!(len, 8759);
                assert_eq!(expected, 8760);
                assert_eq!(resource, Resource::Solar);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_long_profile_is_cut_to_horizon() {
        let mut profile = vec![0.25; 8784];
        profile[8760] = 0.9;
        let cut = validate_profile(&key(1.0, 2.0), Resource::Wind, &profile, 8760).unwrap();
        assert_eq!(cut.len(), 8760);
        assert!(cut.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_nan_in_horizon_is_rejected() {
        let mut profile = vec![0.25; 24];
        profile[7] = f64::NAN;
        let err = validate_profile(&key(1.0, 2.0), Resource::Wind, &profile, 24).unwrap_err();
        assert!(matches!(err, SizingError::NonFiniteProfile { hour: 7, .. }));
    }

    #[test]
    fn test_negative_value_in_horizon_is_rejected() {
        let mut profile = vec![0.25; 24];
        profile[3] = -0.2;
        let err = validate_profile(&key(1.0, 2.0), Resource::Solar, &profile, 24).unwrap_err();
        assert!(matches!(
            err,
            SizingError::NegativeProfile { hour: 3, value, .. } if value == -0.2
        ));

        // hours past the horizon are not inspected
        let mut long = vec![0.25; 25];
        long[24] = -1.0;
        assert!(validate_profile(&key(1.0, 2.0), Resource::Solar, &long, 24).is_ok());
    }

    #[test]
    fn test_missing_profile() {
        let mut solar = ProfileMap::new();
        solar.insert(key(1.0, 2.0), vec![0.1; 4]);
        let profiles = ResourceProfiles::new(solar, ProfileMap::new());

        assert!(profiles.get(&key(1.0, 2.0), Resource::Solar).is_ok());
        let err = profiles.site_profiles(&key(1.0, 2.0), 4).unwrap_err();
        assert!(matches!(
            err,
            SizingError::MissingProfile {
                resource: Resource::Wind,
                ..
            }
        ));
    }

    #[test]
    fn test_read_profile_map_keeps_input_order() {
        let json = r#"{"10.5,20.25": [0.1, 0.2], "-3,4": [0.0, 1.0]}"#;
        let map = read_profile_map(json.as_bytes()).unwrap();

        let keys: Vec<SiteKey> = map.keys().copied().collect();
        assert_eq!(keys, vec![key(10.5, 20.25), key(-3.0, 4.0)]);
        assert_eq!(map[&key(-3.0, 4.0)], vec![0.0, 1.0]);
    }

    #[test]
    fn test_load_profile_map_from_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(&temp_file, r#"{"1,1": [0.5, 0.5, 0.5]}"#).unwrap();

        let map = load_profile_map(temp_file.path()).unwrap();
        assert_eq!(map.len(), 1);
        assert!(load_profile_map(Path::new("does/not/exist.json")).is_err());
    }
}
