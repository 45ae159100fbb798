//! Orientation resolution for the image being annotated
//!
//! Decoding runs on the blocking pool so the interactive side never waits
//! on disk or the codec. The result must be checked against the display
//! geometry that is current when it arrives, not the one at dispatch.

use std::fmt;
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};

use crate::domain::{DisplayGeometry, ImageReference, Orientation};
use crate::error::StartError;

/// Outcome of comparing a resolved orientation with the current display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Display already matches; rendering may proceed
    Current(Orientation),
    /// Display changed while resolving; the render step must be skipped
    Stale {
        resolved: Orientation,
        current: Orientation,
    },
}

/// Decoded image together with the orientation it needs
pub struct ResolvedImage {
    pub orientation: Orientation,
    /// Full-resolution pixels, EXIF rotation already applied
    pub pixels: RgbaImage,
}

impl fmt::Debug for ResolvedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedImage")
            .field("orientation", &self.orientation)
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

pub struct OrientationResolver;

impl OrientationResolver {
    /// Decode the image and determine its orientation, off the interactive thread
    pub async fn resolve(image: ImageReference) -> Result<ResolvedImage, StartError> {
        tokio::task::spawn_blocking(move || Self::resolve_blocking(&image))
            .await
            .map_err(|err| StartError::Task(err.to_string()))?
    }

    pub fn resolve_blocking(image: &ImageReference) -> Result<ResolvedImage, StartError> {
        let pixels = load_oriented(image.path())
            .map_err(|source| StartError::Load {
                path: image.path().to_path_buf(),
                source,
            })?
            .into_rgba8();
        let (width, height) = pixels.dimensions();
        let orientation = Orientation::from_dimensions(width, height);
        log::debug!("Resolved {image} ({width}x{height}) to {orientation:?}");
        Ok(ResolvedImage { orientation, pixels })
    }

    /// Re-check a resolved orientation against the display as it is now
    pub fn check(resolved: Orientation, display: DisplayGeometry) -> Freshness {
        let current = display.orientation();
        if current == resolved {
            Freshness::Current(resolved)
        } else {
            Freshness::Stale { resolved, current }
        }
    }
}

/// Decode an image file with its EXIF orientation applied
pub fn load_oriented(path: &Path) -> Result<DynamicImage, image::ImageError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}
