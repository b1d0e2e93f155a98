//! # Error Handling
//!
//! Error types for the batch density pipeline.
//!
//! Every failure carries a lightweight [`ErrorContext`] naming the operation that
//! was running and, when relevant, the file it touched. The batch driver uses
//! [`GoldError::category`] and [`GoldError::is_region_local`] to decide whether a
//! failure skips one region or aborts the whole run.
//!
//! ## Usage
//!
//! ```rust
//! use gold_density::error::GoldError;
//!
//! let error = GoldError::division_by_zero("pyre")
//!     .with_operation("add_region")
//!     .with_path("cellA.tif");
//!
//! assert_eq!(error.category(), "division_by_zero");
//! assert!(error.is_region_local());
//! ```

use std::{error::Error as StdError, fmt, path::Path};

/// Where an error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// File the operation was reading or writing
    pub path: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().display().to_string());
        self
    }
}

/// Base error type for the crate
#[derive(Debug)]
pub enum GoldError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// A region was measured with an area of exactly zero
    DivisionByZero {
        label: String,
        context: ErrorContext,
    },
    /// A region area that is negative, NaN or infinite
    InvalidArea {
        label: String,
        area: f64,
        context: ErrorContext,
    },
    /// A region boundary that cannot be used for measurement
    Boundary {
        reason: String,
        context: ErrorContext,
    },
    /// The human (or the stand-in for one) did not supply a selection
    Selection {
        image: String,
        reason: String,
        context: ErrorContext,
    },
    /// The external measurement engine failed or answered nonsense
    Engine {
        program: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Errors from a library we delegate encoding/decoding to
    External {
        library: &'static str,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl GoldError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn division_by_zero(label: impl Into<String>) -> Self {
        Self::DivisionByZero {
            label: label.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn invalid_area(label: impl Into<String>, area: f64) -> Self {
        Self::InvalidArea {
            label: label.into(),
            area,
            context: ErrorContext::new(),
        }
    }

    pub fn boundary(reason: impl Into<String>) -> Self {
        Self::Boundary {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn selection(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Selection {
            image: image.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn engine(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Engine {
            program: program.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: ErrorContext::new().with_operation(operation),
        }
    }

    /// Create an external library error
    pub fn external(library: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::External {
            library,
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add the file the failing operation touched
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.context_mut().path = Some(path.as_ref().display().to_string());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::DivisionByZero { context, .. } => context,
            Self::InvalidArea { context, .. } => context,
            Self::Boundary { context, .. } => context,
            Self::Selection { context, .. } => context,
            Self::Engine { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::DivisionByZero { context, .. } => context,
            Self::InvalidArea { context, .. } => context,
            Self::Boundary { context, .. } => context,
            Self::Selection { context, .. } => context,
            Self::Engine { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get error category as string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::DivisionByZero { .. } => "division_by_zero",
            Self::InvalidArea { .. } => "invalid_area",
            Self::Boundary { .. } => "boundary",
            Self::Selection { .. } => "selection",
            Self::Engine { .. } => "engine",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// Errors that only invalidate the region being measured. The batch skips
    /// that region and keeps going.
    pub fn is_region_local(&self) -> bool {
        matches!(
            self,
            Self::DivisionByZero { .. }
                | Self::InvalidArea { .. }
                | Self::Boundary { .. }
                | Self::Engine { .. }
        )
    }
}

impl fmt::Display for GoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoldError::Config {
                field,
                value,
                reason,
                ..
            } => write!(
                f,
                "Configuration error in field '{}' with value '{}': {}",
                field, value, reason
            ),
            GoldError::DivisionByZero { label, .. } => write!(
                f,
                "Region '{}' has zero area, density is undefined",
                label
            ),
            GoldError::InvalidArea { label, area, .. } => {
                write!(f, "Region '{}' has invalid area {}", label, area)
            }
            GoldError::Boundary { reason, .. } => write!(f, "Invalid region boundary: {}", reason),
            GoldError::Selection { image, reason, .. } => {
                write!(f, "No region selected for '{}': {}", image, reason)
            }
            GoldError::Engine {
                program, reason, ..
            } => write!(f, "Measurement engine '{}' failed: {}", program, reason),
            GoldError::Io { source, context } => {
                let operation = context.operation.as_deref().unwrap_or("unknown");
                if let Some(path) = &context.path {
                    write!(f, "I/O error during {} on '{}': {}", operation, path, source)
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            GoldError::External {
                library, source, ..
            } => write!(f, "{} error: {}", library, source),
        }
    }
}

impl StdError for GoldError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type GoldResult<T> = Result<T, GoldError>;

impl From<std::io::Error> for GoldError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for GoldError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<csv::Error> for GoldError {
    fn from(error: csv::Error) -> Self {
        Self::external("csv", error)
    }
}

impl From<zip::result::ZipError> for GoldError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::external("zip", error)
    }
}

impl From<image::ImageError> for GoldError {
    fn from(error: image::ImageError) -> Self {
        Self::external("image", error)
    }
}
