//! Image/mask pairing by file name.
//!
//! The folder is listed once, sorted by name, and each candidate image is
//! checked for its mask only when the iterator reaches it. Images without a
//! mask are skipped without error. Matching is case-sensitive.

use std::{
    fs,
    path::{Path, PathBuf},
    vec,
};

use tracing::debug;

use super::ImagePair;
use crate::config::{DEFAULT_EXTENSION, DEFAULT_MASK_SUFFIX};
use crate::error::{GoldError, GoldResult};

/// File-name convention linking an image to its mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRules {
    /// Image extension including the dot, e.g. `.tif`
    pub extension: String,
    /// Inserted between stem and extension for the mask, e.g. `_seg`
    pub mask_suffix: String,
}

impl Default for PairingRules {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION, DEFAULT_MASK_SUFFIX)
    }
}

impl PairingRules {
    pub fn new(extension: impl Into<String>, mask_suffix: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            mask_suffix: mask_suffix.into(),
        }
    }

    /// Stem of `file_name` if it names a source image (not a mask).
    pub fn image_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = file_name.strip_suffix(self.extension.as_str())?;
        if stem.is_empty() || stem.ends_with(self.mask_suffix.as_str()) {
            return None;
        }
        Some(stem)
    }

    pub fn mask_name(&self, stem: &str) -> String {
        format!("{}{}{}", stem, self.mask_suffix, self.extension)
    }

    /// List `folder` and return a lazy iterator over its matched pairs.
    pub fn pairs(&self, folder: &Path) -> GoldResult<PairIter> {
        PairIter::new(folder, self.clone())
    }
}

/// Lazy sequence of [`ImagePair`]s in file-name order.
#[derive(Debug)]
pub struct PairIter {
    folder: PathBuf,
    rules: PairingRules,
    candidates: vec::IntoIter<String>,
}

impl PairIter {
    fn new(folder: &Path, rules: PairingRules) -> GoldResult<Self> {
        let entries = fs::read_dir(folder)
            .map_err(|e| GoldError::io("list folder", e).with_path(folder))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GoldError::io("list folder", e).with_path(folder))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            // Non-UTF-8 names cannot follow the naming convention.
            if let Ok(name) = entry.file_name().into_string() {
                if rules.image_stem(&name).is_some() {
                    names.push(name);
                }
            }
        }
        names.sort();

        Ok(Self {
            folder: folder.to_path_buf(),
            rules,
            candidates: names.into_iter(),
        })
    }
}

impl Iterator for PairIter {
    type Item = ImagePair;

    fn next(&mut self) -> Option<ImagePair> {
        for name in self.candidates.by_ref() {
            let Some(stem) = self.rules.image_stem(&name) else {
                continue;
            };
            let mask = self.folder.join(self.rules.mask_name(stem));
            if mask.is_file() {
                return Some(ImagePair::new(stem, self.folder.join(&name), mask));
            }
            debug!(image = %name, "no mask, skipping");
        }
        None
    }
}
