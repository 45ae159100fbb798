//! JPEG encoding of pixel buffers

use std::io;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

/// Encode `image` as baseline JPEG, flattened onto white
pub fn write_jpeg<W: io::Write>(w: W, image: &RgbaImage, quality: u8) -> image::ImageResult<()> {
    let rgb = flatten_onto_white(image);
    let mut encoder = JpegEncoder::new_with_quality(w, quality.clamp(1, 100));
    encoder.encode_image(&rgb)
}

/// JPEG has no alpha channel; composite over an opaque white page
fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let a = u32::from(a);
        let over = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over(r), over(g), over(b)])
    })
}

/// Collapse an encoder failure into the IO failure class
pub fn into_io(err: image::ImageError) -> io::Error {
    match err {
        image::ImageError::IoError(err) => err,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
