use crate::domain::{ImageReference, Orientation, Stroke};
use crate::error::SurfaceError;
use crate::render::{DrawingSurface, PixelBuffer};

use super::token::SessionToken;

/// Edit state of one annotation session
///
/// Stroke storage lives in the drawing surface; dirtiness is always read
/// back from it rather than tracked here.
#[derive(Debug)]
pub struct AnnotationSession<S> {
    token: SessionToken,
    image: ImageReference,
    orientation: Orientation,
    surface: S,
}

impl<S: DrawingSurface> AnnotationSession<S> {
    pub fn new(
        token: SessionToken,
        image: ImageReference,
        orientation: Orientation,
        surface: S,
    ) -> Self {
        Self {
            token,
            image,
            orientation,
            surface,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn commit_stroke(&mut self, stroke: Stroke) {
        self.surface.render_stroke(stroke);
    }

    pub fn undo(&mut self) {
        self.surface.undo_last();
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    pub fn is_clear(&self) -> bool {
        self.surface.is_clear()
    }

    /// Flatten the strokes visible right now over the base image
    pub fn snapshot(&self) -> Result<PixelBuffer, SurfaceError> {
        self.surface.rasterize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrokeColor;
    use crate::render::Canvas;
    use crate::session::TokenSource;
    use image::RgbaImage;

    fn session() -> AnnotationSession<Canvas> {
        let token = TokenSource::new().issue();
        AnnotationSession::new(
            token,
            ImageReference::from_path("/tmp/photo.png"),
            Orientation::Portrait,
            Canvas::new(RgbaImage::new(16, 16)),
        )
    }

    fn stroke(x: f32) -> Stroke {
        Stroke::new(vec![(x, 1.0), (x, 8.0)], StrokeColor::default(), 2.0)
    }

    #[test]
    fn test_is_clear_tracks_net_strokes() {
        let mut session = session();
        // Each step: 1 = commit, -1 = undo, 0 = clear
        let ops = [1, 1, -1, -1, -1, 1, 0, 0, 1, 1, 1, -1, 1, -1, -1, -1, -1];
        let mut net = 0i32;
        for op in ops {
            match op {
                1 => {
                    session.commit_stroke(stroke(net as f32 + 1.0));
                    net += 1;
                }
                -1 => {
                    session.undo();
                    net = (net - 1).max(0);
                }
                _ => {
                    session.clear();
                    net = 0;
                }
            }
            assert_eq!(session.is_clear(), net == 0, "after op {op}, net {net}");
            assert_eq!(session.surface().stroke_count() as i32, net);
        }
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = session();
        session.commit_stroke(stroke(2.0));
        session.commit_stroke(stroke(4.0));

        session.clear();
        let once = session.snapshot().unwrap();
        session.clear();
        assert!(session.is_clear());
        assert_eq!(session.snapshot().unwrap(), once);
    }

    #[test]
    fn test_snapshot_reflects_current_strokes() {
        let mut session = session();
        let blank = session.snapshot().unwrap();
        session.commit_stroke(stroke(4.0));
        let drawn = session.snapshot().unwrap();
        assert_ne!(blank, drawn);

        session.undo();
        assert_eq!(session.snapshot().unwrap(), blank);
    }
}
