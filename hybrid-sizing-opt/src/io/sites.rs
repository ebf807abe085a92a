//! Site table input.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use hybrid_model::{Site, SiteKey};
use serde::Deserialize;

use crate::capacity::error::{SizingError, SizingResult};

/// One row of the input site table
#[derive(Debug, Deserialize)]
struct SiteRow {
    lon: f64,
    lat: f64,
    pv_potential: f64,
    wind_potential: f64,
}

/// Loads the site table CSV (`lon,lat,pv_potential,wind_potential`).
///
/// Potentials are multiplied by `potential_scale` to obtain MW.
///
/// # Errors
///
/// Fails on unreadable files, malformed rows, invalid coordinates or
/// potentials, and on a site key that appears twice.
pub fn load_site_table(path: &Path, potential_scale: f64) -> SizingResult<Vec<Site>> {
    let file = File::open(path)?;
    read_site_table(BufReader::new(file), potential_scale)
}

/// Reads a site table from any reader, keeping row order
pub fn read_site_table(reader: impl Read, potential_scale: f64) -> SizingResult<Vec<Site>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut sites = Vec::new();
    let mut seen = HashSet::new();

    for (line, row) in rdr.deserialize::<SiteRow>().enumerate() {
        let row = row?;
        let key = SiteKey::new(row.lon, row.lat)
            .map_err(|e| SizingError::InvalidInput(format!("row {}: {}", line + 1, e)))?;
        if !seen.insert(key) {
            return Err(SizingError::DuplicateSite(key));
        }
        let site = Site::new(
            key,
            row.pv_potential * potential_scale,
            row.wind_potential * potential_scale,
        )
        .map_err(|e| SizingError::InvalidInput(format!("row {}: {}", line + 1, e)))?;
        sites.push(site);
    }

    Ok(sites)
}
