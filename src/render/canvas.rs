//! Raster canvas using tiny-skia
//!
//! Strokes are kept as vectors and only flattened onto the base image
//! when a snapshot is requested.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8,
    Stroke as SkStroke, Transform,
};

use super::{DrawingSurface, PixelBuffer, SurfaceFactory};
use crate::domain::{ImageReference, Stroke};
use crate::error::SurfaceError;

/// Base image plus the ordered list of committed strokes
#[derive(Clone, Debug)]
pub struct Canvas {
    base: RgbaImage,
    strokes: Vec<Stroke>,
}

impl Canvas {
    pub fn new(base: RgbaImage) -> Self {
        Self {
            base,
            strokes: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }
}

impl DrawingSurface for Canvas {
    fn render_stroke(&mut self, stroke: Stroke) {
        if stroke.is_empty() {
            log::debug!("Ignoring stroke with nothing to draw");
            return;
        }
        self.strokes.push(stroke);
    }

    fn undo_last(&mut self) {
        self.strokes.pop();
    }

    fn clear(&mut self) {
        self.strokes.clear();
    }

    fn is_clear(&self) -> bool {
        self.strokes.is_empty()
    }

    fn rasterize(&self) -> Result<PixelBuffer, SurfaceError> {
        let mut img = self.base.clone();
        with_pixmap(&mut img, |pixmap| {
            for stroke in &self.strokes {
                draw_stroke(pixmap, stroke);
            }
        })?;
        Ok(img)
    }
}

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
///
/// `RgbaImage` holds straight alpha while tiny-skia works on premultiplied
/// pixels, so both directions convert. Pixels the drawing left alone are
/// not written back, keeping the base exact where it is translucent.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) -> Result<(), SurfaceError> {
    let (w, h) = (img.width(), img.height());
    let size = tiny_skia::IntSize::from_wh(w, h)
        .ok_or_else(|| SurfaceError::Raster(format!("invalid canvas size {w}x{h}")))?;
    let data: Vec<u8> = img
        .pixels()
        .flat_map(|&px| {
            let c = premultiply(px);
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    let mut pixmap = Pixmap::from_vec(data, size)
        .ok_or_else(|| SurfaceError::Raster("pixel buffer does not match canvas size".into()))?;

    f(&mut pixmap);

    // Copy back
    for (dst, &drawn) in img.pixels_mut().zip(pixmap.pixels()) {
        if drawn != premultiply(*dst) {
            let c = drawn.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
    }
    Ok(())
}

fn premultiply(Rgba([r, g, b, a]): Rgba<u8>) -> PremultipliedColorU8 {
    ColorU8::from_rgba(r, g, b, a).premultiply()
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke) {
    let [r, g, b, a] = stroke.color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    // A single tap leaves a dot the size of the pen
    if let [(x, y)] = stroke.points.as_slice() {
        if let Some(dot) = PathBuilder::from_circle(*x, *y, stroke.width / 2.0) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let mut pb = PathBuilder::new();
    let mut points = stroke.points.iter();
    if let Some(&(x, y)) = points.next() {
        pb.move_to(x, y);
    }
    for &(x, y) in points {
        pb.line_to(x, y);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let sk_stroke = SkStroke {
        width: stroke.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &sk_stroke, Transform::identity(), None);
}

/// Opens `Canvas` surfaces over already decoded images
#[derive(Clone, Copy, Debug, Default)]
pub struct CanvasFactory;

impl SurfaceFactory for CanvasFactory {
    type Surface = Canvas;

    fn open(&self, image: &ImageReference, base: RgbaImage) -> Result<Canvas, SurfaceError> {
        log::debug!(
            "Canvas opened for {}: {}x{} pixels",
            image,
            base.width(),
            base.height()
        );
        Ok(Canvas::new(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrokeColor;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn black_line() -> Stroke {
        Stroke::new(
            vec![(2.0, 10.0), (18.0, 10.0)],
            StrokeColor {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            },
            4.0,
        )
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut canvas = Canvas::new(white(4, 4));
        canvas.undo_last();
        assert!(canvas.is_clear());
        assert_eq!(canvas.stroke_count(), 0);
    }

    #[test]
    fn test_empty_strokes_are_not_committed() {
        let mut canvas = Canvas::new(white(4, 4));
        canvas.render_stroke(Stroke::new(vec![], StrokeColor::default(), 4.0));
        canvas.render_stroke(Stroke::new(vec![(1.0, 1.0)], StrokeColor::default(), 0.0));
        assert!(canvas.is_clear());
    }

    #[test]
    fn test_rasterize_draws_strokes_over_base() {
        let mut canvas = Canvas::new(white(20, 20));
        canvas.render_stroke(black_line());

        let img = canvas.rasterize().unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(10, 10)[0], 0);
        // Far from the line stays untouched
        assert_eq!(img.get_pixel(10, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_rasterize_does_not_mutate_state() {
        let mut canvas = Canvas::new(white(20, 20));
        canvas.render_stroke(black_line());
        let first = canvas.rasterize().unwrap();
        let second = canvas.rasterize().unwrap();
        assert_eq!(first, second);
        assert_eq!(canvas.stroke_count(), 1);

        canvas.undo_last();
        assert_eq!(canvas.rasterize().unwrap(), white(20, 20));
    }

    #[test]
    fn test_single_point_leaves_a_dot() {
        let mut canvas = Canvas::new(white(20, 20));
        canvas.render_stroke(Stroke::new(
            vec![(10.0, 10.0)],
            StrokeColor {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            },
            6.0,
        ));
        let img = canvas.rasterize().unwrap();
        assert_eq!(img.get_pixel(10, 10)[0], 0);
    }

    #[test]
    fn test_strokes_over_transparent_base_keep_their_color() {
        let clear = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 0]));
        let mut canvas = Canvas::new(clear);
        canvas.render_stroke(Stroke::new(
            vec![(2.0, 10.0), (18.0, 10.0)],
            StrokeColor {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            },
            3.0,
        ));

        let img = canvas.rasterize().unwrap();
        assert_eq!(img.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
        // Anti-aliased edge: partly covered, still pure black
        let edge = img.get_pixel(10, 8);
        assert!(edge[3] > 0 && edge[3] < 255, "edge alpha {}", edge[3]);
        assert_eq!(&edge.0[..3], &[0, 0, 0]);
        assert_eq!(img.get_pixel(10, 1), &Rgba([255, 255, 255, 0]));
    }

    #[test]
    fn test_zero_sized_canvas_fails_rasterize() {
        let canvas = Canvas::new(RgbaImage::new(0, 0));
        assert!(matches!(canvas.rasterize(), Err(SurfaceError::Raster(_))));
    }

    #[test]
    fn test_factory_wraps_given_pixels() {
        let canvas = CanvasFactory
            .open(&ImageReference::from_path("/sdcard/shot.png"), white(8, 3))
            .unwrap();
        assert_eq!((canvas.width(), canvas.height()), (8, 3));
        assert!(canvas.is_clear());
        assert_eq!(canvas.rasterize().unwrap(), white(8, 3));
    }
}
