//! Per-image region set artifact.
//!
//! `<stem>_rois.zip` holds one JSON entry per region, named
//! `<index>-<label>.json` so that archive order matches measurement order.

use std::{fs::File, io::Write, path::Path};

use tracing::debug;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::error::{GoldError, GoldResult};
use crate::region::RegionBoundary;

/// Entry name for the `index`-th region. Path separators in labels are
/// replaced so every entry stays at the archive root.
pub fn entry_name(index: usize, label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{:02}-{}.json", index + 1, label)
}

/// Write `regions` to `path`, replacing any existing archive.
pub fn save_roi_set(path: &Path, regions: &[RegionBoundary]) -> GoldResult<()> {
    let file = File::create(path).map_err(|e| GoldError::io("save region set", e).with_path(path))?;
    let mut zip = ZipWriter::new(file);
    for (index, region) in regions.iter().enumerate() {
        zip.start_file(entry_name(index, &region.label), SimpleFileOptions::default())
            .map_err(|e| GoldError::from(e).with_path(path))?;
        let json = serde_json::to_vec_pretty(region)?;
        zip.write_all(&json)
            .map_err(|e| GoldError::io("save region set", e).with_path(path))?;
    }
    zip.finish().map_err(|e| GoldError::from(e).with_path(path))?;

    debug!(path = %path.display(), regions = regions.len(), "region set saved");
    Ok(())
}
