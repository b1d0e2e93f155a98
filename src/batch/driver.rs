//! Batch orchestration.
//!
//! [`BatchRun`] owns the result table for the whole run and threads it through
//! one step per image:
//!
//! 1. read the image dimensions
//! 2. ask the selector for the cell outline, then the pyrenoid outline
//! 3. save `<stem>_rois.zip`
//! 4. measure `pyre`, then `cell-noPyr`, and add each to the table
//!
//! After the last image the table is exported once to the results file.
//!
//! Failures are handled per scope. A missing mask never reaches the driver.
//! An unreadable image or a rejected selection skips that image; a failed
//! measurement or a zero area skips that region. Only a [`GoldError::Selection`]
//! error, a failed region-set write or a failed export end the run; the rows
//! measured up to that point are then written to the error log.

use std::path::PathBuf;

use tracing::{error, info, warn};

use super::{ImagePair, roi_set};
use crate::config::BatchConfig;
use crate::error::{GoldError, GoldResult};
use crate::measure::RegionMeasurer;
use crate::region::{RegionKind, RegionSelector, cell_regions};
use crate::table::DensityTable;

/// An image left out of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub stem: String,
    pub reason: String,
}

/// A region left out of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRegion {
    pub stem: String,
    pub label: String,
    pub reason: String,
}

/// Outcome of a completed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub images_processed: usize,
    pub images_skipped: Vec<SkippedImage>,
    pub regions_skipped: Vec<SkippedRegion>,
    pub rows_written: usize,
    pub results_path: PathBuf,
}

/// A fatal error out of one image step, with the rows gathered so far.
struct Aborted {
    table: DensityTable,
    error: GoldError,
}

/// Dump rows that never reached the results file into the error log.
fn log_unwritten_rows(table: &DensityTable, reason: &str) {
    if table.is_empty() {
        return;
    }
    error!("{}, {} rows were not written:", reason, table.len());
    for record in table {
        error!(
            "  {},{},{},{}",
            record.label, record.particle_count, record.area, record.density
        );
    }
}

/// One batch run over a folder.
pub struct BatchRun<S, M> {
    config: BatchConfig,
    selector: S,
    measurer: M,
}

impl<S: RegionSelector, M: RegionMeasurer> BatchRun<S, M> {
    pub fn new(config: BatchConfig, selector: S, measurer: M) -> Self {
        Self {
            config,
            selector,
            measurer,
        }
    }

    /// Process every matched pair and export the result table.
    pub fn run(mut self) -> GoldResult<BatchReport> {
        self.config.validate()?;
        let results_path = self.config.results_path();
        let mut report = BatchReport {
            results_path: results_path.clone(),
            ..BatchReport::default()
        };

        info!(folder = %self.config.folder.display(), "starting batch");
        let mut table = DensityTable::new();
        for pair in self.config.pairing_rules().pairs(&self.config.folder)? {
            table = match self.process_image(&pair, table, &mut report) {
                Ok(table) => table,
                Err(Aborted { table, error }) => {
                    log_unwritten_rows(&table, "batch aborted");
                    return Err(error);
                }
            };
        }

        if let Err(e) = table.export(&results_path) {
            log_unwritten_rows(&table, "export failed");
            return Err(e);
        }

        report.rows_written = table.len();
        info!(
            images = report.images_processed,
            skipped_images = report.images_skipped.len(),
            skipped_regions = report.regions_skipped.len(),
            rows = report.rows_written,
            path = %results_path.display(),
            "batch complete"
        );
        Ok(report)
    }

    fn process_image(
        &mut self,
        pair: &ImagePair,
        mut table: DensityTable,
        report: &mut BatchReport,
    ) -> Result<DensityTable, Aborted> {
        info!(image = %pair.stem, "processing");

        let bounds = match pair.dimensions() {
            Ok(dims) => Some(dims),
            Err(e) => {
                warn!(image = %pair.stem, "skipping image: {}", e);
                report.images_skipped.push(SkippedImage {
                    stem: pair.stem.clone(),
                    reason: e.to_string(),
                });
                return Ok(table);
            }
        };

        let outlines = self.select(pair, RegionKind::Cell, bounds).and_then(|cell| {
            let pyrenoid = self.select(pair, RegionKind::Pyrenoid, bounds)?;
            Ok((cell, pyrenoid))
        });
        let (cell, pyrenoid) = match outlines {
            Ok(outlines) => outlines,
            Err(error @ GoldError::Selection { .. }) => return Err(Aborted { table, error }),
            Err(e) => {
                warn!(image = %pair.stem, "skipping image: {}", e);
                report.images_skipped.push(SkippedImage {
                    stem: pair.stem.clone(),
                    reason: e.to_string(),
                });
                return Ok(table);
            }
        };

        let prefix = self.config.qualify_labels.then_some(pair.stem.as_str());
        let regions = cell_regions(cell, pyrenoid, prefix);
        if let Err(error) = roi_set::save_roi_set(&pair.sibling(&self.config.roi_set_suffix), &regions) {
            return Err(Aborted { table, error });
        }

        for region in &regions {
            let added = self
                .measurer
                .measure(pair, region)
                .and_then(|m| table.add_region(&region.label, m.area, m.particle_count).map(|_| ()));
            match added {
                Ok(()) => {}
                Err(e) if e.is_region_local() => {
                    warn!(image = %pair.stem, region = %region.label, "skipping region: {}", e);
                    report.regions_skipped.push(SkippedRegion {
                        stem: pair.stem.clone(),
                        label: region.label.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(error) => return Err(Aborted { table, error }),
            }
        }

        report.images_processed += 1;
        Ok(table)
    }

    fn select(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<crate::region::Outline> {
        self.selector.obtain_region_boundary(pair, kind, bounds)
    }
}
