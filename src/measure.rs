//! # Region Measurement
//!
//! Area and particle counts come from an external image-processing engine. The
//! crate only defines the contract ([`RegionMeasurer`]) and one way of reaching
//! an engine: running it as a subprocess per region ([`HostCommandMeasurer`]).
//!
//! ## Engine protocol
//!
//! ```text
//! <program> <args...> <image_path> <mask_path>
//!   stdin:  the RegionBoundary as JSON
//!   stdout: {"area": 50.0, "count": 10}
//!   exit:   0
//! ```
//!
//! Anything printed on stderr is passed through to the terminal.

use std::{
    ffi::OsString,
    io::{self, Write},
    process::{Command, Stdio},
    thread,
};

use serde::Deserialize;
use tracing::debug;

use crate::batch::ImagePair;
use crate::error::{GoldError, GoldResult};
use crate::region::RegionBoundary;

/// Area and particle count of one region of one image.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Measurement {
    pub area: f64,
    #[serde(rename = "count")]
    pub particle_count: u64,
}

impl Measurement {
    pub fn new(area: f64, particle_count: u64) -> Self {
        Self {
            area,
            particle_count,
        }
    }
}

/// The external engine. `area` and `particle_count` must describe the same
/// region of the same image; nothing here checks that.
pub trait RegionMeasurer {
    fn measure(&mut self, pair: &ImagePair, region: &RegionBoundary) -> GoldResult<Measurement>;
}

impl<T: RegionMeasurer + ?Sized> RegionMeasurer for &mut T {
    fn measure(&mut self, pair: &ImagePair, region: &RegionBoundary) -> GoldResult<Measurement> {
        (**self).measure(pair, region)
    }
}

/// Runs an engine command once per region.
#[derive(Debug, Clone)]
pub struct HostCommandMeasurer {
    program: OsString,
    args: Vec<OsString>,
}

impl HostCommandMeasurer {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments passed before the image and mask paths.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn wait_failed(&self, e: io::Error) -> GoldError {
        GoldError::engine(self.program_name(), format!("lost track of the engine: {}", e))
    }

    fn parse_reply(&self, stdout: &[u8]) -> GoldResult<Measurement> {
        let reply: Measurement = serde_json::from_slice(stdout).map_err(|e| {
            GoldError::engine(
                self.program_name(),
                format!(
                    "unreadable reply '{}': {}",
                    String::from_utf8_lossy(stdout).trim(),
                    e
                ),
            )
        })?;
        if !reply.area.is_finite() || reply.area < 0.0 {
            return Err(GoldError::engine(
                self.program_name(),
                format!("reported area {}", reply.area),
            ));
        }
        Ok(reply)
    }
}

impl RegionMeasurer for HostCommandMeasurer {
    fn measure(&mut self, pair: &ImagePair, region: &RegionBoundary) -> GoldResult<Measurement> {
        let payload = serde_json::to_vec(region)?;

        debug!(program = %self.program_name(), image = %pair.stem, region = %region.label, "invoking engine");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&pair.image)
            .arg(&pair.mask)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| GoldError::engine(self.program_name(), format!("failed to start: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GoldError::engine(self.program_name(), "stdin not available"))?;
        // stdin is fed from its own thread so an engine that talks before it
        // reads cannot fill the stdout pipe and stall both sides.
        let output = thread::scope(|scope| {
            scope.spawn(move || {
                // An engine that exits without reading stdin closes the pipe;
                // its exit status below is what matters.
                if let Err(e) = stdin.write_all(&payload) {
                    debug!("engine did not read the region: {}", e);
                }
            });
            child.wait_with_output()
        })
        .map_err(|e| self.wait_failed(e).with_path(&pair.image))?;
        if !output.status.success() {
            return Err(GoldError::engine(
                self.program_name(),
                format!("exited with status {}", output.status),
            )
            .with_path(&pair.image));
        }

        self.parse_reply(&output.stdout)
            .map_err(|e| e.with_operation(format!("measure {}", region.label)))
    }
}
