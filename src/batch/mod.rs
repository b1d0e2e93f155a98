//! # Batch Processing
//!
//! Folder walking and per-image orchestration.
//!
//! - `pairs`: matches `<stem>.tif` images with their `<stem>_seg.tif` masks
//! - `roi_set`: writes the `<stem>_rois.zip` region set for each image
//! - `driver`: runs selection, measurement and tabulation over every pair

pub mod driver;
pub mod pairs;
pub mod roi_set;

use std::path::{Path, PathBuf};

pub use driver::{BatchReport, BatchRun, SkippedImage, SkippedRegion};
pub use pairs::{PairIter, PairingRules};

/// An image and its segmentation mask, sharing a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    /// Base file name without extension, e.g. `cellA`
    pub stem: String,
    pub image: PathBuf,
    pub mask: PathBuf,
}

impl ImagePair {
    pub fn new(stem: impl Into<String>, image: impl Into<PathBuf>, mask: impl Into<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            image: image.into(),
            mask: mask.into(),
        }
    }

    /// `<folder>/<stem><suffix>`, a side file living next to the image.
    pub fn sibling(&self, suffix: &str) -> PathBuf {
        let dir = self.image.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{}{}", self.stem, suffix))
    }

    /// Pixel dimensions of the source image.
    pub fn dimensions(&self) -> crate::error::GoldResult<(u32, u32)> {
        image::image_dimensions(&self.image).map_err(|e| {
            crate::error::GoldError::from(e)
                .with_operation("read image dimensions")
                .with_path(&self.image)
        })
    }
}
