//! # Regions of Interest
//!
//! Region boundaries are plain data handed to the measurement engine. The crate
//! never rasterizes them, computes their area or evaluates the set difference in
//! [`RegionShape::Difference`]; that is the engine's job.
//!
//! Boundaries come from a [`RegionSelector`], the human-in-the-loop seam. The
//! batch blocks on [`RegionSelector::obtain_region_boundary`] until a selection
//! is supplied:
//!
//! - [`PromptSelector`] asks a person to type the outline vertices
//! - [`OutlineFileSelector`] replays outlines saved in `<stem>_outlines.json`
//!
//! Tests supply their own implementations.

use std::{
    fmt,
    fs,
    io::{BufRead, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::batch::ImagePair;
use crate::error::{GoldError, GoldResult};

/// Label of the pyrenoid region.
pub const PYRENOID_LABEL: &str = "pyre";
/// Label of the cell-minus-pyrenoid region.
pub const CYTOPLASM_LABEL: &str = "cell-noPyr";
/// Suffix of the saved-outline file read by [`OutlineFileSelector`].
pub const OUTLINE_FILE_SUFFIX: &str = "_outlines.json";

/// A vertex in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed polygon drawn by hand. The last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub vertices: Vec<Point>,
}

impl Outline {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Parse `x,y x,y x,y ...`, the format typed at the prompt.
    pub fn parse(text: &str) -> GoldResult<Self> {
        let vertices = text
            .split_whitespace()
            .map(|token| {
                let (x, y) = token.split_once(',').ok_or_else(|| {
                    GoldError::boundary(format!("expected 'x,y', got '{}'", token))
                })?;
                let x: f64 = x
                    .trim()
                    .parse()
                    .map_err(|_| GoldError::boundary(format!("bad x coordinate in '{}'", token)))?;
                let y: f64 = y
                    .trim()
                    .parse()
                    .map_err(|_| GoldError::boundary(format!("bad y coordinate in '{}'", token)))?;
                Ok(Point::new(x, y))
            })
            .collect::<GoldResult<Vec<_>>>()?;
        Ok(Self { vertices })
    }

    /// Check the outline is a usable polygon, optionally inside a
    /// `width` x `height` image.
    pub fn validate(&self, bounds: Option<(u32, u32)>) -> GoldResult<()> {
        if self.vertices.len() < 3 {
            return Err(GoldError::boundary(format!(
                "outline needs at least 3 vertices, got {}",
                self.vertices.len()
            )));
        }
        if let Some(p) = self
            .vertices
            .iter()
            .find(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GoldError::boundary(format!(
                "non-finite vertex ({}, {})",
                p.x, p.y
            )));
        }
        if let Some((width, height)) = bounds {
            let (w, h) = (f64::from(width), f64::from(height));
            if let Some(p) = self
                .vertices
                .iter()
                .find(|p| p.x < 0.0 || p.y < 0.0 || p.x > w || p.y > h)
            {
                return Err(GoldError::boundary(format!(
                    "vertex ({}, {}) lies outside the {}x{} image",
                    p.x, p.y, width, height
                )));
            }
        }
        Ok(())
    }
}

/// Geometry of a region as the engine should interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionShape {
    Outline(Outline),
    /// Everything inside `whole` that is not inside `minus`.
    Difference { whole: Outline, minus: Outline },
}

/// A labelled region boundary, the unit of measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBoundary {
    pub label: String,
    pub shape: RegionShape,
}

impl RegionBoundary {
    pub fn outline(label: impl Into<String>, outline: Outline) -> Self {
        Self {
            label: label.into(),
            shape: RegionShape::Outline(outline),
        }
    }

    pub fn difference(label: impl Into<String>, whole: Outline, minus: Outline) -> Self {
        Self {
            label: label.into(),
            shape: RegionShape::Difference { whole, minus },
        }
    }
}

/// Which outline the human is asked to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Cell,
    Pyrenoid,
}

impl RegionKind {
    /// Key used in `<stem>_outlines.json`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Cell => "cell",
            Self::Pyrenoid => "pyrenoid",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell => write!(f, "whole cell"),
            Self::Pyrenoid => write!(f, "pyrenoid"),
        }
    }
}

/// Build the two measured regions of one cell, in measurement order.
pub fn cell_regions(cell: Outline, pyrenoid: Outline, prefix: Option<&str>) -> Vec<RegionBoundary> {
    let label = |base: &str| match prefix {
        Some(stem) => format!("{}:{}", stem, base),
        None => base.to_string(),
    };
    vec![
        RegionBoundary::outline(label(PYRENOID_LABEL), pyrenoid.clone()),
        RegionBoundary::difference(label(CYTOPLASM_LABEL), cell, pyrenoid),
    ]
}

/// Source of hand-drawn region boundaries.
///
/// Implementations may block for as long as it takes a person to draw. An
/// error of kind [`GoldError::Selection`] means nobody is going to answer and
/// stops the batch; any other error skips the current image.
pub trait RegionSelector {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline>;
}

impl<T: RegionSelector + ?Sized> RegionSelector for &mut T {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline> {
        (**self).obtain_region_boundary(pair, kind, bounds)
    }
}

/// Interactive selector: prompts on `output`, reads one outline per line from
/// `input`. Bad answers are reported and the question is asked again.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptSelector<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the terminal.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> RegionSelector for PromptSelector<R, W> {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline> {
        loop {
            write!(
                self.output,
                "[{}] outline the {} as x,y x,y x,y ...: ",
                pair.stem, kind
            )
            .and_then(|_| self.output.flush())
            .map_err(|e| GoldError::io("prompt", e))?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| GoldError::selection(&pair.stem, format!("failed to read answer: {}", e)))?;
            if read == 0 {
                return Err(GoldError::selection(
                    &pair.stem,
                    format!("input closed while waiting for the {} outline", kind),
                ));
            }

            match Outline::parse(&line).and_then(|o| o.validate(bounds).map(|_| o)) {
                Ok(outline) => {
                    debug!(image = %pair.stem, %kind, vertices = outline.vertices.len(), "outline selected");
                    return Ok(outline);
                }
                Err(e) => {
                    warn!(image = %pair.stem, %kind, "rejected outline: {}", e);
                    writeln!(self.output, "{}, please draw it again", e)
                        .map_err(|e| GoldError::io("prompt", e))?;
                }
            }
        }
    }
}

/// Replays outlines stored next to each image in `<stem>_outlines.json`:
///
/// ```json
/// { "cell": [[0, 0], [40, 0], [40, 40]], "pyrenoid": [[5, 5], [10, 5], [10, 10]] }
/// ```
#[derive(Debug, Default)]
pub struct OutlineFileSelector;

impl OutlineFileSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn outline_path(pair: &ImagePair) -> PathBuf {
        pair.sibling(OUTLINE_FILE_SUFFIX)
    }
}

impl RegionSelector for OutlineFileSelector {
    fn obtain_region_boundary(
        &mut self,
        pair: &ImagePair,
        kind: RegionKind,
        bounds: Option<(u32, u32)>,
    ) -> GoldResult<Outline> {
        let path = Self::outline_path(pair);
        let text = fs::read_to_string(&path)
            .map_err(|e| GoldError::io("read outlines", e).with_path(&path))?;
        let mut saved: std::collections::HashMap<String, Vec<[f64; 2]>> =
            serde_json::from_str(&text).map_err(|e| GoldError::from(e).with_path(&path))?;

        let vertices = saved.remove(kind.key()).ok_or_else(|| {
            GoldError::boundary(format!("no '{}' outline", kind.key())).with_path(&path)
        })?;
        let outline = Outline::new(vertices.into_iter().map(|[x, y]| Point::new(x, y)).collect());
        outline.validate(bounds).map_err(|e| e.with_path(&path))?;
        Ok(outline)
    }
}
