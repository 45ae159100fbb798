//! Error types for annotation sessions
//!
//! Start failures abort screen construction; save failures leave the
//! user editing. Neither is fatal to the hosting process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a drawing surface
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Rasterizing the current strokes failed
    #[error("Rasterization failed: {0}")]
    Raster(String),
}

/// Failure while starting a session
#[derive(Error, Debug)]
pub enum StartError {
    /// A required input was missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The image could not be read or decoded
    #[error("Could not load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The background resolver died before reporting
    #[error("Orientation task failed: {0}")]
    Task(String),

    /// The drawing surface could not be created
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Failure while saving an annotated image
#[derive(Error, Debug)]
pub enum SaveError {
    /// Rasterization failed before anything was written
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// The destination directory does not exist and cannot be created
    #[error("Destination directory {path} is unavailable: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The image reference has no file name to derive an output name from
    #[error("Image reference {0} has no usable file name")]
    InvalidReference(PathBuf),

    /// Every candidate name up to the attempt limit is taken
    #[error("No free file name for '{stem}' after {attempts} attempts")]
    NamingExhausted { stem: String, attempts: u32 },

    /// Encoding or writing the output failed
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The background writer died before reporting
    #[error("Save task failed: {0}")]
    Task(String),
}

impl SaveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SaveError::Io {
            path: path.into(),
            source,
        }
    }
}
