//! Drawing surface capability
//!
//! This module contains:
//! - The `DrawingSurface` trait an annotation session drives
//! - The `SurfaceFactory` trait that opens a surface for an image
//! - A tiny-skia backed raster canvas (for saving to file)

pub mod canvas;

pub use canvas::{Canvas, CanvasFactory};

use crate::domain::{ImageReference, Stroke};
use crate::error::SurfaceError;

/// Rasterized image handed to the capture pipeline
pub type PixelBuffer = image::RgbaImage;

/// Anything that can hold strokes over a base image and flatten them
pub trait DrawingSurface {
    /// Commit a finished stroke
    fn render_stroke(&mut self, stroke: Stroke);

    /// Remove the most recent stroke; no-op when there is none
    fn undo_last(&mut self);

    /// Remove every stroke
    fn clear(&mut self);

    /// True when no strokes are committed
    fn is_clear(&self) -> bool;

    /// Base image composited with all current strokes, at full resolution
    fn rasterize(&self) -> Result<PixelBuffer, SurfaceError>;
}

/// Opens a drawing surface for the image a session annotates
///
/// `base` is the image already decoded off the interactive thread; opening
/// must not touch the disk again.
pub trait SurfaceFactory {
    type Surface: DrawingSurface;

    fn open(
        &self,
        image: &ImageReference,
        base: PixelBuffer,
    ) -> Result<Self::Surface, SurfaceError>;
}
