//! # Density Table
//!
//! The in-memory result table for one batch run and its CSV serialization.
//!
//! Records can only be appended through [`DensityTable::add_region`], which
//! rejects zero, negative and non-finite areas. Every stored density is
//! therefore finite, and the exported file never contains `inf` or `NaN`.
//!
//! ## Export format
//!
//! | Column      | Source                 |
//! |-------------|------------------------|
//! | `ImageRois` | region label           |
//! | `nbGold`    | particle count         |
//! | `Area`      | region area            |
//! | `Density`   | `nbGold / Area`        |
//!
//! Numbers use Rust's shortest round-trip `Display` form (`50`, `0.2`), so two
//! exports of the same table are byte-identical.

use std::{
    fs::{self, Permissions},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{GoldError, GoldResult};

/// Header row of the exported result file.
pub const HEADER: [&str; 4] = ["ImageRois", "nbGold", "Area", "Density"];

/// One measured region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub label: String,
    pub area: f64,
    pub particle_count: u64,
    pub density: f64,
}

impl RegionRecord {
    /// Fields in export column order.
    fn to_row(&self) -> [String; 4] {
        [
            self.label.clone(),
            self.particle_count.to_string(),
            self.area.to_string(),
            self.density.to_string(),
        ]
    }
}

/// Ordered result table, one row per measured region in measurement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityTable {
    records: Vec<RegionRecord>,
}

impl DensityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the density of a region and append it to the table.
    ///
    /// # Errors
    ///
    /// - [`GoldError::DivisionByZero`] when `area == 0`
    /// - [`GoldError::InvalidArea`] when `area` is negative, NaN or infinite
    ///
    /// The table is left untouched on error.
    pub fn add_region(
        &mut self,
        label: impl Into<String>,
        area: f64,
        particle_count: u64,
    ) -> GoldResult<&RegionRecord> {
        let label = label.into();
        if area == 0.0 {
            return Err(GoldError::division_by_zero(label).with_operation("add_region"));
        }
        if !area.is_finite() || area < 0.0 {
            return Err(GoldError::invalid_area(label, area).with_operation("add_region"));
        }

        let density = particle_count as f64 / area;
        debug!(%label, area, particle_count, density, "region added");
        let index = self.records.len();
        self.records.push(RegionRecord {
            label,
            area,
            particle_count,
            density,
        });
        Ok(&self.records[index])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RegionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegionRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<RegionRecord> {
        self.records
    }

    /// Serialize the table to any writer, header first.
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> GoldResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER)?;
        for record in &self.records {
            wtr.write_record(record.to_row())?;
        }
        wtr.flush()
            .map_err(|e| GoldError::io("flush result table", e))?;
        Ok(())
    }

    /// Write the table to `destination`, replacing any existing file.
    ///
    /// The rows go to a temporary file in the destination's directory first,
    /// which is then renamed over the destination, so a failed export never
    /// leaves a truncated result file behind. The new file keeps the
    /// permissions of the one it replaces (`0o644` on unix for a new file).
    pub fn export(&self, destination: &Path) -> GoldResult<()> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staging = NamedTempFile::new_in(dir)
            .map_err(|e| GoldError::io("export", e).with_path(destination))?;
        self.write_to(staging.as_file_mut())
            .map_err(|e| e.with_path(destination))?;
        if let Some(permissions) = result_permissions(destination) {
            staging
                .as_file()
                .set_permissions(permissions)
                .map_err(|e| GoldError::io("export", e).with_path(destination))?;
        }
        staging
            .persist(destination)
            .map_err(|e| GoldError::io("export", e.error).with_path(destination))?;

        debug!(path = %destination.display(), rows = self.len(), "result table exported");
        Ok(())
    }
}

/// Permissions for an exported file: those of the file being replaced, else
/// world-readable on unix. The staging file itself is owner-only.
fn result_permissions(destination: &Path) -> Option<Permissions> {
    match fs::metadata(destination) {
        Ok(meta) if meta.is_file() => Some(meta.permissions()),
        _ => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

impl<'a> IntoIterator for &'a DensityTable {
    type Item = &'a RegionRecord;
    type IntoIter = std::slice::Iter<'a, RegionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
