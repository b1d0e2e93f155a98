//! Common test utilities for the gold-density integration tests
//!
//! Fixture folders with real (tiny) TIFF images, and stand-ins for the human
//! selecting regions and for the external measurement engine.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use gold_density::{
    GoldError, GoldResult, ImagePair, Measurement, Outline, RegionBoundary, RegionKind,
    RegionMeasurer, RegionSelector,
};

/// Side length of fixture images.
pub const IMAGE_SIZE: u32 = 64;

/// Write a blank `IMAGE_SIZE` square TIFF at `dir/name`.
pub fn write_tiff(dir: &Path, name: &str) {
    image::GrayImage::new(IMAGE_SIZE, IMAGE_SIZE)
        .save(dir.join(name))
        .expect("failed to write fixture image");
}

/// Write `name.tif` and, when `with_mask`, `name_seg.tif`.
pub fn add_image(dir: &Path, stem: &str, with_mask: bool) {
    write_tiff(dir, &format!("{}.tif", stem));
    if with_mask {
        write_tiff(dir, &format!("{}_seg.tif", stem));
    }
}

pub fn cell_outline() -> Outline {
    Outline::parse("2,2 60,2 60,60 2,60").unwrap()
}

pub fn pyrenoid_outline() -> Outline {
    Outline::parse("20,20 30,20 30,30 20,30").unwrap()
}

/// Answers every request with the same cell and pyrenoid outlines and
/// remembers what was asked.
#[derive(Default)]
pub struct FixedSelector {
    pub requests: Vec<(String, RegionKind)>,
}

impl RegionSelector for FixedSelector {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        _bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline> {
        self.requests.push((pair.stem.clone(), kind));
        Ok(match kind {
            RegionKind::Cell => cell_outline(),
            RegionKind::Pyrenoid => pyrenoid_outline(),
        })
    }
}

/// Answers a fixed number of requests, then behaves like a closed terminal.
pub struct ExhaustedSelector {
    pub remaining: usize,
}

impl RegionSelector for ExhaustedSelector {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline> {
        if self.remaining == 0 {
            return Err(GoldError::selection(&pair.stem, "input closed"));
        }
        self.remaining -= 1;
        FixedSelector::default().obtain_region_boundary(pair, kind, bounds)
    }
}

/// Engine stand-in answering from a table keyed by (image stem, region label).
#[derive(Default)]
pub struct TableMeasurer {
    answers: HashMap<(String, String), GoldResult<Measurement>>,
    pub calls: Vec<(String, RegionBoundary)>,
}

impl TableMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stem: &str, label: &str, area: f64, count: u64) -> Self {
        self.answers.insert(
            (stem.to_string(), label.to_string()),
            Ok(Measurement::new(area, count)),
        );
        self
    }

    pub fn failing(mut self, stem: &str, label: &str) -> Self {
        self.answers.insert(
            (stem.to_string(), label.to_string()),
            Err(GoldError::engine("stub-engine", "exited with status 1")),
        );
        self
    }
}

impl RegionMeasurer for TableMeasurer {
    fn measure(&mut self, pair: &ImagePair, region: &RegionBoundary) -> GoldResult<Measurement> {
        self.calls.push((pair.stem.clone(), region.clone()));
        match self
            .answers
            .remove(&(pair.stem.clone(), region.label.clone()))
        {
            Some(answer) => answer,
            None => Err(GoldError::engine(
                "stub-engine",
                format!("no answer for {}/{}", pair.stem, region.label),
            )),
        }
    }
}

/// Read an exported result file into lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("result file missing")
        .lines()
        .map(str::to_string)
        .collect()
}

/// In-memory sink for log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every log event on this thread written to the returned buffer.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buffer.contents())
}
