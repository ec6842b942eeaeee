//! End-to-end recognition of one raster snapshot.
//!
//! The classifier itself is external; anything implementing
//! [`DigitClassifier`] (including a plain closure) can be plugged in.

use crate::cluster::{ClusterConfig, Clusterizator};
use crate::error::{Error, Result};
use crate::normalize::{ImageNormalizer, NormalizedImage};
use crate::points::Point;
use image::{GenericImageView, Pixel};
use ndarray::Array4;

/// Inference contract of a trained digit model.
pub trait DigitClassifier {
    /// Class probabilities for a `1 × 28 × 28 × 1` batch.
    fn predict(&self, batch: &Array4<f32>) -> Result<Vec<f32>>;
}

impl<F> DigitClassifier for F
where
    F: Fn(&Array4<f32>) -> Result<Vec<f32>>,
{
    fn predict(&self, batch: &Array4<f32>) -> Result<Vec<f32>> {
        self(batch)
    }
}

/// Inclusive pixel bounds of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Leftmost column.
    pub min_x: i32,
    /// Topmost row.
    pub min_y: i32,
    /// Rightmost column.
    pub max_x: i32,
    /// Bottom row.
    pub max_y: i32,
}

impl Bounds {
    fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x(),
            min_y: first.y(),
            max_x: first.x(),
            max_y: first.y(),
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x()),
            min_y: b.min_y.min(p.y()),
            max_x: b.max_x.max(p.x()),
            max_y: b.max_y.max(p.y()),
        }))
    }
}

/// Classification of one cluster.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Cluster label.
    pub cluster: usize,
    /// Where the cluster sits in the drawing.
    pub bounds: Bounds,
    /// Normalized image that was classified.
    pub image: NormalizedImage,
    /// Classifier output.
    pub probabilities: Vec<f32>,
    /// Index of the most probable class.
    pub digit: usize,
}

/// Runs extraction, clustering, normalization and classification.
#[derive(Debug, Clone)]
pub struct Recognizer<C> {
    classifier: C,
    config: ClusterConfig,
    normalizer: ImageNormalizer,
}

impl<C: DigitClassifier> Recognizer<C> {
    /// Create a recognizer around `classifier`.
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            config: ClusterConfig::default(),
            normalizer: ImageNormalizer::new(),
        }
    }

    /// Replace the clustering configuration.
    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Recognize every digit in `image`.
    ///
    /// `auto_detect` and `count` have the meaning of
    /// [`Clusterizator::clusterize`]. An empty result means nothing was
    /// found to recognize. Empty clusters are skipped.
    pub fn recognize<I>(&self, image: &I, auto_detect: bool, count: usize) -> Result<Vec<Recognition>>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        self.recognize_with_progress(image, auto_detect, count, |_| {})
    }

    /// Like [`recognize`](Self::recognize), forwarding clustering progress.
    pub fn recognize_with_progress<I, F>(
        &self,
        image: &I,
        auto_detect: bool,
        count: usize,
        progress: F,
    ) -> Result<Vec<Recognition>>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
        F: FnMut(u8),
    {
        let mut clusterizator = Clusterizator::from_image(image).with_config(self.config.clone());
        let clusters = clusterizator.clusterize_with_progress(auto_detect, count, progress)?;

        let mut out = Vec::with_capacity(clusters.len());
        for (cluster, points) in clusters.iter().enumerate() {
            let Some(bounds) = Bounds::of(points) else {
                tracing::debug!(cluster, "skipping empty cluster");
                continue;
            };
            let image = self.normalizer.normalize(points)?;
            let probabilities = self.classifier.predict(&image.to_batch())?;
            let digit = argmax(&probabilities).ok_or(Error::EmptyInput)?;

            tracing::info!(cluster, digit, n_points = points.len(), "recognized digit");
            out.push(Recognition {
                cluster,
                bounds,
                image,
                probabilities,
                digit,
            });
        }
        Ok(out)
    }
}

/// Index of the largest value; first one wins ties, NaN never wins.
fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
