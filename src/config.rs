//! # Configuration Module
//!
//! Configuration for one batch run. The CLI maps its arguments onto
//! [`BatchConfig`]; library users build one directly.
//!
//! ## Parameters
//!
//! | Parameter        | Default             | Description                              |
//! |------------------|---------------------|------------------------------------------|
//! | `folder`         | `.`                 | Folder holding images and masks          |
//! | `extension`      | `.tif`              | Image extension, dot included            |
//! | `mask_suffix`    | `_seg`              | `<stem><suffix><extension>` is the mask  |
//! | `roi_set_suffix` | `_rois.zip`         | Per-image region set artifact            |
//! | `results_file`   | `_GoldResults.csv`  | Batch result table, inside `folder`      |
//! | `qualify_labels` | `false`             | Prefix region labels with the image stem |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use gold_density::config::BatchConfig;
//!
//! let config = BatchConfig::new("/data/run1").with_qualified_labels(true);
//! config.validate().unwrap();
//! assert!(config.results_path().ends_with("_GoldResults.csv"));
//! ```

use std::path::{Path, PathBuf};

use crate::batch::PairingRules;
use crate::error::{GoldError, GoldResult};

pub const DEFAULT_EXTENSION: &str = ".tif";
pub const DEFAULT_MASK_SUFFIX: &str = "_seg";
pub const DEFAULT_ROI_SET_SUFFIX: &str = "_rois.zip";
pub const DEFAULT_RESULTS_FILE: &str = "_GoldResults.csv";

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Folder scanned for `<stem><extension>` images. Outputs are written here too.
    pub folder: PathBuf,

    /// Image file extension including the leading dot. Matching is
    /// case-sensitive.
    pub extension: String,

    /// Suffix between the stem and the extension that marks a mask.
    pub mask_suffix: String,

    /// Suffix of the per-image region set written next to each image.
    pub roi_set_suffix: String,

    /// File name of the batch result table, created inside `folder`.
    pub results_file: String,

    /// Write `cellA:pyre` instead of `pyre` so rows from different images can
    /// be told apart.
    pub qualify_labels: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
            mask_suffix: DEFAULT_MASK_SUFFIX.to_string(),
            roi_set_suffix: DEFAULT_ROI_SET_SUFFIX.to_string(),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
            qualify_labels: false,
        }
    }
}

impl BatchConfig {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_mask_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.mask_suffix = suffix.into();
        self
    }

    pub fn with_results_file(mut self, name: impl Into<String>) -> Self {
        self.results_file = name.into();
        self
    }

    pub fn with_qualified_labels(mut self, qualify: bool) -> Self {
        self.qualify_labels = qualify;
        self
    }

    /// Validates the configuration parameters.
    ///
    /// # Validation Rules
    ///
    /// - `folder` must be an existing directory
    /// - `extension` must start with `.` and have something after it
    /// - `mask_suffix` and `roi_set_suffix` must not be empty
    /// - `results_file` must be a plain file name, not a path
    pub fn validate(&self) -> GoldResult<()> {
        if !self.folder.is_dir() {
            return Err(GoldError::config(
                "folder",
                self.folder.display().to_string(),
                "not a directory",
            ));
        }
        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            return Err(GoldError::config(
                "extension",
                &self.extension,
                "must start with '.', e.g. '.tif'",
            ));
        }
        if self.mask_suffix.is_empty() {
            return Err(GoldError::config(
                "mask_suffix",
                &self.mask_suffix,
                "must not be empty, masks would be indistinguishable from images",
            ));
        }
        if self.roi_set_suffix.is_empty() {
            return Err(GoldError::config(
                "roi_set_suffix",
                &self.roi_set_suffix,
                "must not be empty",
            ));
        }
        let name = Path::new(&self.results_file);
        if self.results_file.is_empty()
            || name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true)
        {
            return Err(GoldError::config(
                "results_file",
                &self.results_file,
                "must be a file name without directories",
            ));
        }
        Ok(())
    }

    pub fn pairing_rules(&self) -> PairingRules {
        PairingRules::new(&self.extension, &self.mask_suffix)
    }

    pub fn results_path(&self) -> PathBuf {
        self.folder.join(&self.results_file)
    }
}
