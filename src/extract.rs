//! Foreground point extraction from a raster snapshot.
//!
//! The drawing surface is assumed near-achromatic (black ink on white), so the
//! red channel alone decides the clear cases and the RGB mean is only consulted
//! for anti-aliased edge pixels.

use crate::points::PointSet;
use image::{GenericImageView, Pixel};

/// Ink intensity of one pixel in `[0, 1]`.
///
/// `0.0` for pure white (red == 255), `1.0` for pure black (red == 0), and
/// `mean(r, g, b) / 255` for everything in between.
#[inline]
pub fn ink_intensity(rgb: [u8; 3]) -> f64 {
    match rgb[0] {
        255 => 0.0,
        0 => 1.0,
        _ => (f64::from(rgb[0]) + f64::from(rgb[1]) + f64::from(rgb[2])) / 3.0 / 255.0,
    }
}

/// Scans rasters for ink.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointExtractor;

impl PointExtractor {
    /// Collect every pixel with non-zero ink intensity as a `(column, row)`
    /// point, in row-major scan order.
    ///
    /// Works with any 8-bit view (RGB, RGBA, luma); alpha is ignored. A
    /// zero-sized raster yields an empty set.
    pub fn extract<I>(image: &I) -> PointSet
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let (width, height) = image.dimensions();
        let mut points = PointSet::new();

        for y in 0..height {
            for x in 0..width {
                let rgb = image.get_pixel(x, y).to_rgb().0;
                if ink_intensity(rgb) != 0.0 {
                    points.push(x as i32, y as i32);
                }
            }
        }

        tracing::debug!(width, height, n_points = points.len(), "extracted ink points");
        points
    }
}
