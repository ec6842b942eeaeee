//! # inkdigits
//!
//! Segmentation and normalization of handwritten digits for an MNIST-style
//! classifier.
//!
//! A raster snapshot of a drawing goes through three stages:
//!
//! 1. [`PointExtractor`]: every inked pixel becomes a [`Point`].
//! 2. [`Clusterizator`]: points are standardized and grouped with k-means,
//!    one group per digit; the number of digits can be found automatically
//!    from the elbow of the inertia curve.
//! 3. [`ImageNormalizer`]: each group is cropped, scaled into a 20×20 box,
//!    binarized, padded to 28×28 and recentered on its center of mass.
//!
//! [`Recognizer`] chains the stages and hands each normalized digit to a
//! [`DigitClassifier`] supplied by the caller.
//!
//! Everything is synchronous. With the `parallel` feature, k-means restarts
//! and silhouette scoring use rayon; results do not change.

pub mod cluster;
/// Error types used across `inkdigits`.
pub mod error;
pub mod extract;
pub mod metrics;
pub mod normalize;
pub mod points;
pub mod recognize;


pub use cluster::{ClusterConfig, Clustering, Clusterizator, KScan, Kmeans, KneeLocator};
pub use error::{Error, Result};
pub use extract::{ink_intensity, PointExtractor};
pub use normalize::{ImageNormalizer, NormalizedImage, CONTENT_SIZE, FRAME_SIZE};
pub use points::{ClusterCollection, Point, PointSet};
pub use recognize::{Bounds, DigitClassifier, Recognition, Recognizer};
