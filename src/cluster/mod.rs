//! Clustering of ink points into digits.
//!
//! ## Pipeline
//!
//! 1. **Standardize** x and y to zero mean, unit variance ([`StandardScaler`]),
//!    so a wide drawing does not make horizontal distances dominate.
//! 2. **Choose k**: either fixed, or scanned over `1..=max` with the elbow of the
//!    inertia curve picked by [`KneeLocator`].
//! 3. **K-means** ([`Kmeans`]) with many random restarts, best inertia kept.
//! 4. **Bucket** the points by label in scan order.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then move each centroid to the
//! mean of its points. Repeat.
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**: clusters are roughly spherical and of similar size. Digits
//! written side by side satisfy this well enough once coordinates are
//! standardized.
//!
//! ## Choosing k
//!
//! `J` always drops as k grows. The elbow is where the drop flattens out: past
//! it, new clusters are splitting digits rather than separating them. The
//! silhouette coefficient of each candidate is computed as a diagnostic.
//!
//! ## Usage
//!
//! ```rust
//! use inkdigits::cluster::{ClusterConfig, Clusterizator};
//! use inkdigits::PointSet;
//!
//! let points: PointSet = [(0, 0), (1, 0), (0, 1), (90, 90), (91, 90), (90, 91)]
//!     .into_iter()
//!     .collect();
//!
//! let mut clusterizator = Clusterizator::new(points)
//!     .with_config(ClusterConfig::default().with_n_init(10));
//! let clusters = clusterizator.clusterize(false, 2).unwrap();
//! assert_eq!(clusters.sizes(), vec![3, 3]);
//! ```

mod clusterizator;
mod kmeans;
mod knee;
mod scale;
mod traits;

pub use clusterizator::{ClusterConfig, Clusterizator, KScan};
pub use kmeans::{Kmeans, KmeansFit, KmeansInit};
pub use knee::{Curve, Direction, KneeLocator};
pub use scale::StandardScaler;
pub use traits::Clustering;
