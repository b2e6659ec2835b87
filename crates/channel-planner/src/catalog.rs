//! Constellation catalog loading from JSON files
//!
//! File layout: an array of `{"name": ..., "Walkers": [[...], ...]}` where each
//! Walker row is `[inclination_deg, sats_per_plane, plane_count, phase_factor,
//! altitude_km, raan_span_deg, raan_start_deg]`.
//!
//! Rows stay as read until their entry is looked up, so a malformed entry
//! only fails lookups that resolve to it.

use crate::{PlannerError, Result};
use orbital_mechanics::{BodyConstants, Constellation, OrbitalError, WalkerShell};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw catalog entry from JSON
#[derive(Debug, Clone, Deserialize)]
struct RawConstellation {
    name: Option<String>,
    #[serde(rename = "Walkers", default)]
    walkers: Vec<Vec<f64>>,
}

/// A named constellation with its shells in SI units and radians.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub shells: Vec<WalkerShell>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<RawConstellation>,
}

/// Whole, non-negative count field of a Walker row.
fn count_field(value: f64, field: &str, row: usize, name: &str) -> Result<u32> {
    if value.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&value) {
        return Err(OrbitalError::InvalidShell(format!(
            "{} row {}: {} must be a non-negative whole number, got {}",
            name, row, field, value
        ))
        .into());
    }
    Ok(value as u32)
}

fn shell_from_row(row: &[f64], index: usize, name: &str) -> Result<WalkerShell> {
    let &[inclination, spp, planes, phase, altitude, span, start] = row else {
        return Err(OrbitalError::InvalidShell(format!(
            "{} row {}: expected 7 fields, got {}",
            name,
            index,
            row.len()
        ))
        .into());
    };
    let sats_per_plane = count_field(spp, "sats_per_plane", index, name)?;
    let plane_count = count_field(planes, "plane_count", index, name)?;
    if phase.fract() != 0.0 || phase.abs() > i32::MAX as f64 {
        return Err(OrbitalError::InvalidShell(format!(
            "{} row {}: phase factor must be a whole number, got {}",
            name, index, phase
        ))
        .into());
    }
    Ok(WalkerShell::from_catalog_units(
        inclination,
        sats_per_plane,
        plane_count,
        phase as i32,
        altitude,
        span,
        start,
    ))
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading constellation catalog from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let raw: Vec<RawConstellation> = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawConstellation> = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Vec<RawConstellation>) -> Result<Self> {
        let total = raw.len();
        let entries: Vec<RawConstellation> = raw
            .into_iter()
            .filter(|item| item.name.as_deref().is_some_and(|n| !n.trim().is_empty()))
            .collect();

        if entries.len() < total {
            warn!(
                "Skipped {} catalog entries without a name",
                total - entries.len()
            );
        }
        info!("Loaded {} constellations", entries.len());

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.name.as_deref())
    }

    /// First entry whose name matches, ignoring case, with its rows converted.
    pub fn lookup(&self, name: &str) -> Result<CatalogEntry> {
        let wanted = name.to_lowercase();
        let (raw, entry_name) = self
            .entries
            .iter()
            .find_map(|e| {
                let n = e.name.as_deref()?;
                (n.to_lowercase() == wanted).then_some((e, n))
            })
            .ok_or_else(|| PlannerError::NotFound(name.to_string()))?;

        let shells = raw
            .walkers
            .iter()
            .enumerate()
            .map(|(i, row)| shell_from_row(row, i, entry_name))
            .collect::<Result<Vec<_>>>()?;
        debug!("Catalog entry {} has {} shells", entry_name, shells.len());

        Ok(CatalogEntry {
            name: entry_name.to_string(),
            shells,
        })
    }

    /// Look up `name` and build its constellation.
    pub fn constellation(&self, name: &str, constants: &BodyConstants) -> Result<Constellation> {
        let entry = self.lookup(name)?;
        Ok(Constellation::new(entry.shells, constants)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"[
        {"name": "Starlink", "Walkers": [[53, 22, 72, 39, 550, 360, 0], [97.6, 43, 6, 1, 560, 360, 0]]},
        {"name": "STARLINK", "Walkers": [[70, 20, 36, 11, 570, 360, 0]]},
        {"Walkers": [[45, 2, 2, 0, 500, 360, 0]]},
        {"name": "Probe", "Walkers": [[53, 1, 4, 1, 550, 180, 0]]}
    ]"#;

    #[test]
    fn test_load_catalog_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Starlink", "STARLINK", "Probe"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive_first_match() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        let entry = catalog.lookup("starlink").unwrap();
        assert_eq!(entry.name, "Starlink");
        assert_eq!(entry.shells.len(), 2);

        let shell = &entry.shells[0];
        assert_eq!(shell.sats_per_plane, 22);
        assert_eq!(shell.plane_count, 72);
        assert_eq!(shell.phase_factor, 39);
        assert_eq!(shell.altitude_m, 550_000.0);
        assert!((shell.inclination - 53f64.to_radians()).abs() < 1e-15);
    }

    #[test]
    fn test_lookup_missing_name() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        assert!(matches!(
            catalog.constellation("Kuiper", &BodyConstants::earth()),
            Err(PlannerError::NotFound(name)) if name == "Kuiper"
        ));
    }

    #[test]
    fn test_constellation_from_catalog() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        let c = catalog.constellation("probe", &BodyConstants::earth()).unwrap();
        assert_eq!(c.satellite_count(), 4);
    }

    #[test]
    fn test_fractional_count_rejected() {
        let json = r#"[{"name": "Bad", "Walkers": [[53, 2.5, 4, 1, 550, 360, 0]]}]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert!(matches!(
            catalog.lookup("Bad"),
            Err(PlannerError::Orbital(OrbitalError::InvalidShell(_)))
        ));
    }

    #[test]
    fn test_negative_count_message() {
        let json = r#"[{"name": "Bad", "Walkers": [[53, -3, 4, 1, 550, 360, 0]]}]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let err = catalog.lookup("bad").unwrap_err();
        assert!(err.to_string().contains("non-negative whole number, got -3"));
    }

    #[test]
    fn test_broken_entry_does_not_hide_others() {
        let json = r#"[
            {"name": "Good", "Walkers": [[53, 1, 4, 1, 550, 180, 0]]},
            {"name": "Broken", "Walkers": [[53, -3, 4, 1, 550, 360, 0], [53, 4, 4]]}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let good = catalog.constellation("good", &BodyConstants::earth()).unwrap();
        assert_eq!(good.satellite_count(), 4);
        assert!(matches!(
            catalog.lookup("Broken"),
            Err(PlannerError::Orbital(OrbitalError::InvalidShell(_)))
        ));
    }

    #[test]
    fn test_short_row_rejected_on_lookup() {
        let json = r#"[{"name": "Short", "Walkers": [[53, 4, 4, 1, 550]]}]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert!(matches!(
            catalog.lookup("short"),
            Err(PlannerError::Orbital(OrbitalError::InvalidShell(msg))) if msg.contains("expected 7 fields")
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Catalog::load("/nonexistent/catalog.json"),
            Err(PlannerError::Io(_))
        ));
    }
}
