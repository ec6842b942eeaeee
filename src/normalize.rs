//! MNIST-style normalization of one cluster.
//!
//! MNIST digits are 28×28 with the strokes confined to a central 20×20 box
//! and the ink's center of mass at the frame center. A cluster of ink points
//! is brought into that convention in seven fixed steps:
//!
//! 1. crop to the bounding box and shift to the origin
//! 2. rasterize black on white with a 2-pixel pen
//! 3. resize into 20×20 keeping the aspect ratio (bilinear)
//! 4. invert and binarize at intensity 64
//! 5. pad to 28×28, extra pixel before the content on odd deltas
//! 6. translate so the center of mass lands on (14, 14)
//! 7. reshape to the classifier's rows × cols × channel layout

use crate::error::{Error, Result};
use crate::points::Point;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::{s, Array2, Array3, Array4};

/// Side of the square frame handed to the classifier.
pub const FRAME_SIZE: usize = 28;
/// Side of the box the digit is scaled into before padding.
pub const CONTENT_SIZE: u32 = 20;
/// Stroke width used when rasterizing points.
pub const PEN_WIDTH: i32 = 2;
/// Inverted intensity at or above which a pixel is ink.
pub const INK_THRESHOLD: i32 = 64;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A cluster rendered into the canonical 28×28 binary frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: Array2<f32>,
    scaled: RgbImage,
}

impl NormalizedImage {
    /// 28×28 matrix of 0.0 (background) and 1.0 (ink), indexed `[row, col]`.
    pub fn pixels(&self) -> &Array2<f32> {
        &self.pixels
    }

    /// The downscaled raster (at most 20×20) before binarization.
    pub fn scaled_image(&self) -> &RgbImage {
        &self.scaled
    }

    /// rows × cols × 1 tensor.
    pub fn to_tensor(&self) -> Array3<f32> {
        self.pixels.clone().insert_axis(ndarray::Axis(2))
    }

    /// Single-sample batch, 1 × rows × cols × 1.
    pub fn to_batch(&self) -> Array4<f32> {
        self.to_tensor().insert_axis(ndarray::Axis(0))
    }

    /// Center of mass as `(row, col)`, `None` when the frame is blank.
    pub fn center_of_mass(&self) -> Option<(f64, f64)> {
        center_of_mass(&self.pixels)
    }

    /// Render as an 8-bit image, ink white on black like MNIST.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(FRAME_SIZE as u32, FRAME_SIZE as u32, |x, y| {
            Luma([(self.pixels[[y as usize, x as usize]] * 255.0) as u8])
        })
    }
}

/// Converts point clusters into [`NormalizedImage`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize one cluster.
    ///
    /// Fails with [`Error::EmptyInput`] for an empty slice, and with
    /// [`Error::ContentTooLarge`] if resampling ever produced more than
    /// 20 pixels on a side.
    pub fn normalize(&self, points: &[Point]) -> Result<NormalizedImage> {
        let canvas = rasterize(points)?;
        let (w, h) = canvas.dimensions();
        let (tw, th) = fit_within(w, h, CONTENT_SIZE);
        let scaled = imageops::resize(&canvas, tw, th, FilterType::Triangle);

        let (sw, sh) = scaled.dimensions();
        if sw > CONTENT_SIZE || sh > CONTENT_SIZE {
            return Err(Error::ContentTooLarge {
                width: sw,
                height: sh,
                max: CONTENT_SIZE,
            });
        }

        let content = binarize(&scaled);
        let framed = pad_to_frame(&content);
        let pixels = match center_of_mass(&framed) {
            Some((cy, cx)) => {
                let center = FRAME_SIZE as f64 / 2.0;
                let dy = (center - cy).round_ties_even() as isize;
                let dx = (center - cx).round_ties_even() as isize;
                translate(&framed, dy, dx)
            }
            None => {
                tracing::debug!(w, h, "no ink survived resampling; skipping recentering");
                framed
            }
        };

        tracing::debug!(
            n_points = points.len(),
            canvas = ?(w, h),
            scaled = ?(sw, sh),
            "normalized cluster"
        );

        Ok(NormalizedImage { pixels, scaled })
    }
}

/// Draw the cluster cropped to its bounding box.
///
/// Canvas size is the coordinate extent, at least 1 on each axis. A point at
/// `(x, y)` inks the pen-sized square ending at it: pixels `x-1..=x`,
/// `y-1..=y` for the 2-pixel pen, clipped to the canvas.
fn rasterize(points: &[Point]) -> Result<RgbImage> {
    let first = points.first().ok_or(Error::EmptyInput)?;
    let (mut min_x, mut min_y) = (first.x(), first.y());
    let (mut max_x, mut max_y) = (min_x, min_y);
    for p in points {
        min_x = min_x.min(p.x());
        min_y = min_y.min(p.y());
        max_x = max_x.max(p.x());
        max_y = max_y.max(p.y());
    }

    let width = (max_x - min_x).max(1);
    let height = (max_y - min_y).max(1);
    let mut canvas = RgbImage::from_pixel(width as u32, height as u32, WHITE);

    for p in points {
        let (x, y) = (p.x() - min_x, p.y() - min_y);
        for py in (y - PEN_WIDTH + 1)..=y {
            for px in (x - PEN_WIDTH + 1)..=x {
                if (0..width).contains(&px) && (0..height).contains(&py) {
                    canvas.put_pixel(px as u32, py as u32, BLACK);
                }
            }
        }
    }

    Ok(canvas)
}

/// Largest size with the same aspect ratio fitting in `side`×`side`.
///
/// Integer arithmetic, truncating; never returns a zero side.
fn fit_within(width: u32, height: u32, side: u32) -> (u32, u32) {
    let (w, h, s) = (u64::from(width), u64::from(height), u64::from(side));
    let rw = s * w / h;
    let (tw, th) = if rw <= s { (rw, s) } else { (s, s * h / w) };
    (tw.max(1) as u32, th.max(1) as u32)
}

/// Invert and threshold: ink (dark) becomes 1.0.
fn binarize(image: &RgbImage) -> Array2<f32> {
    let (w, h) = image.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        let [r, g, b] = image.get_pixel(col as u32, row as u32).0;
        let mean = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;
        let intensity = (255.0 - mean) as i32;
        if intensity >= INK_THRESHOLD {
            1.0
        } else {
            0.0
        }
    })
}

/// Embed `content` in a zeroed frame, `ceil(delta/2)` before and
/// `floor(delta/2)` after on each axis.
fn pad_to_frame(content: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = content.dim();
    let top = (FRAME_SIZE - rows).div_ceil(2);
    let left = (FRAME_SIZE - cols).div_ceil(2);

    let mut frame = Array2::zeros((FRAME_SIZE, FRAME_SIZE));
    frame
        .slice_mut(s![top..top + rows, left..left + cols])
        .assign(content);
    frame
}

/// Intensity-weighted mean `(row, col)`, `None` for an all-zero matrix.
pub fn center_of_mass(matrix: &Array2<f32>) -> Option<(f64, f64)> {
    let mut total = 0.0f64;
    let mut sum_r = 0.0f64;
    let mut sum_c = 0.0f64;
    for ((r, c), &v) in matrix.indexed_iter() {
        let v = f64::from(v);
        total += v;
        sum_r += v * r as f64;
        sum_c += v * c as f64;
    }
    (total > 0.0).then(|| (sum_r / total, sum_c / total))
}

/// Shift by `(dy, dx)`; pixels moved out are dropped, exposed area is 0.
fn translate(matrix: &Array2<f32>, dy: isize, dx: isize) -> Array2<f32> {
    let (rows, cols) = matrix.dim();
    let (rows, cols) = (rows as isize, cols as isize);
    Array2::from_shape_fn(matrix.dim(), |(r, c)| {
        let (sr, sc) = (r as isize - dy, c as isize - dx);
        if (0..rows).contains(&sr) && (0..cols).contains(&sc) {
            matrix[[sr as usize, sc as usize]]
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        assert_eq!(fit_within(100, 50, 20), (20, 10));
        assert_eq!(fit_within(50, 100, 20), (10, 20));
        assert_eq!(fit_within(1, 1, 20), (20, 20));
        assert_eq!(fit_within(30, 7, 20), (20, 4));
        assert_eq!(fit_within(200, 1, 20), (20, 1));
    }

    #[test]
    fn test_rasterize_pen_square() {
        let canvas = rasterize(&pts(&[(10, 10), (14, 13)])).unwrap();
        assert_eq!(canvas.dimensions(), (4, 3));
        // (10,10) shifts to the origin: only (0,0) of its pen square is on canvas.
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);
        // (14,13) shifts to (4,3): its square covers (3,2) only.
        assert_eq!(*canvas.get_pixel(3, 2), BLACK);
        assert_eq!(*canvas.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn test_rasterize_degenerate_extent() {
        let canvas = rasterize(&pts(&[(5, 5)])).unwrap();
        assert_eq!(canvas.dimensions(), (1, 1));
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);

        let line = rasterize(&pts(&[(0, 3), (10, 3)])).unwrap();
        assert_eq!(line.dimensions(), (10, 1));
    }

    #[test]
    fn test_binarize_threshold() {
        let mut img = RgbImage::from_pixel(3, 1, WHITE);
        img.put_pixel(0, 0, Rgb([191, 191, 191])); // 255 - 191 = 64 -> ink
        img.put_pixel(1, 0, Rgb([192, 192, 192])); // 63 -> background
        img.put_pixel(2, 0, BLACK);
        let m = binarize(&img);
        assert_eq!(m.row(0).to_vec(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pad_splits_odd_delta_before() {
        let content = Array2::ones((20, 5));
        let frame = pad_to_frame(&content);
        // rows: delta 8 -> 4/4; cols: delta 23 -> 12 before, 11 after
        assert_eq!(frame.sum(), 100.0);
        assert_eq!(frame[[4, 12]], 1.0);
        assert_eq!(frame[[3, 12]], 0.0);
        assert_eq!(frame[[4, 11]], 0.0);
        assert_eq!(frame[[23, 16]], 1.0);
        assert_eq!(frame[[23, 17]], 0.0);
    }

    #[test]
    fn test_translate_fills_with_background() {
        let mut m = Array2::zeros((4, 4));
        m[[0, 0]] = 1.0;
        m[[3, 3]] = 1.0;
        let shifted = translate(&m, 1, 2);
        assert_eq!(shifted[[1, 2]], 1.0);
        assert_eq!(shifted.sum(), 1.0);
    }

    #[test]
    fn test_center_of_mass() {
        let mut m = Array2::zeros((5, 5));
        m[[1, 1]] = 1.0;
        m[[3, 1]] = 1.0;
        assert_eq!(center_of_mass(&m), Some((2.0, 1.0)));
        assert_eq!(center_of_mass(&Array2::zeros((3, 3))), None);
    }

    #[test]
    fn test_single_point_fills_centered_box() {
        let img = ImageNormalizer::new().normalize(&pts(&[(5, 5)])).unwrap();
        assert_eq!(img.pixels().dim(), (28, 28));
        assert_eq!(img.scaled_image().dimensions(), (20, 20));
        // 20×20 of ink padded 4 on every side; COM 13.5 rounds (half to even) to no shift.
        assert_eq!(img.pixels().sum(), 400.0);
        assert_eq!(img.pixels()[[4, 4]], 1.0);
        assert_eq!(img.pixels()[[23, 23]], 1.0);
        assert_eq!(img.pixels()[[3, 4]], 0.0);
        assert_eq!(img.center_of_mass(), Some((13.5, 13.5)));
    }

    #[test]
    fn test_vertical_stroke_is_recentered() {
        // A "1": tall thin stroke, offset far to the right in the drawing.
        let coords: Vec<(i32, i32)> = (0..60).map(|y| (300, 100 + y)).collect();
        let img = ImageNormalizer::new().normalize(&pts(&coords)).unwrap();

        let (cy, cx) = img.center_of_mass().unwrap();
        assert!((cy - 14.0).abs() <= 1.0, "row COM {cy}");
        assert!((cx - 14.0).abs() <= 1.0, "col COM {cx}");
    }

    #[test]
    fn test_tensor_shapes() {
        let img = ImageNormalizer::new()
            .normalize(&pts(&[(0, 0), (10, 10), (0, 10), (10, 0)]))
            .unwrap();
        assert_eq!(img.to_tensor().shape(), &[28, 28, 1]);
        assert_eq!(img.to_batch().shape(), &[1, 28, 28, 1]);
        assert_eq!(img.to_tensor()[[5, 6, 0]], img.pixels()[[5, 6]]);

        let luma = img.to_luma();
        assert_eq!(luma.dimensions(), (28, 28));
        assert!(luma.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_empty_cluster_is_error() {
        assert_eq!(ImageNormalizer::new().normalize(&[]), Err(Error::EmptyInput));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn normalize_yields_binary_frame(
            coords in proptest::collection::vec((0i32..200, 0i32..200), 1..60),
        ) {
            let img = ImageNormalizer::new().normalize(&pts(&coords)).unwrap();
            prop_assert_eq!(img.pixels().dim(), (FRAME_SIZE, FRAME_SIZE));
            prop_assert!(img.pixels().iter().all(|&v| v == 0.0 || v == 1.0));
            let (sw, sh) = img.scaled_image().dimensions();
            prop_assert!(sw <= CONTENT_SIZE && sh <= CONTENT_SIZE);
        }
    }
}
