//! # Gold Density
//!
//! Batch tabulation of particle (immunogold) densities over a folder of
//! microscopy images and their segmentation masks.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `batch`: image/mask pairing, per-image orchestration, region set artifacts
//! - `region`: region boundaries and the human-in-the-loop selection seam
//! - `measure`: the external measurement engine contract
//! - `table`: density computation and the CSV result table
//! - `config`: batch configuration and validation
//! - `error`: error types shared by all of the above
//!
//! Segmentation, particle counting and region geometry all belong to the
//! external engine behind [`measure::RegionMeasurer`]. This crate decides what
//! gets measured, in which order, and how the numbers are written down.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gold_density::{BatchConfig, BatchRun, HostCommandMeasurer, PromptSelector};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::new("/data/run1");
//! let engine = HostCommandMeasurer::new("fiji-measure");
//! let report = BatchRun::new(config, PromptSelector::stdio(), engine).run()?;
//! println!("{} rows written to {}", report.rows_written, report.results_path.display());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod measure;
pub mod region;
pub mod table;

pub use batch::{BatchReport, BatchRun, ImagePair, PairIter, PairingRules};
pub use config::BatchConfig;
pub use error::{GoldError, GoldResult};
pub use measure::{HostCommandMeasurer, Measurement, RegionMeasurer};
pub use region::{
    Outline, OutlineFileSelector, Point, PromptSelector, RegionBoundary, RegionKind,
    RegionSelector, RegionShape,
};
pub use table::{DensityTable, RegionRecord};
