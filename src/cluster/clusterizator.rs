//! Splitting a drawing's ink points into per-digit groups.
//!
//! Coordinates are standardized, then k-means runs either with a fixed k or,
//! in auto mode, for every candidate k up to a maximum. The candidate scan
//! records inertia (and the silhouette coefficient for k > 1) and picks k at
//! the elbow of the inertia curve. When the curve has no elbow the result is
//! empty: there is no confident answer to give.

use super::kmeans::{Kmeans, KmeansFit, KmeansInit};
use super::knee::{Curve, Direction, KneeLocator};
use super::scale::StandardScaler;
use crate::error::{Error, Result};
use crate::extract::PointExtractor;
use crate::metrics::silhouette_score;
use crate::points::{ClusterCollection, PointSet};
use image::{GenericImageView, Pixel};
use ndarray::Array2;

/// Configuration for the clustering stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Independent k-means initializations per fit.
    pub n_init: usize,
    /// Iteration cap per initialization.
    pub max_iter: usize,
    /// Convergence tolerance on squared centroid shift.
    pub tol: f64,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Centroid initialization strategy.
    pub init: KmeansInit,
    /// Kneedle sensitivity for the elbow search.
    pub sensitivity: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_init: 100,
            max_iter: 3000,
            tol: 1e-4,
            seed: 42,
            init: KmeansInit::Random,
            sensitivity: 1.0,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the initialization strategy.
    pub fn with_init(mut self, init: KmeansInit) -> Self {
        self.init = init;
        self
    }

    /// Set the elbow sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    fn kmeans(&self, k: usize) -> Kmeans {
        Kmeans::new(k)
            .with_n_init(self.n_init)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol)
            .with_init(self.init)
            .with_seed(self.seed)
    }
}

/// Result of evaluating every candidate cluster count.
#[derive(Debug, Clone)]
pub struct KScan {
    /// Inertia per candidate, index `k - 1`.
    pub inertias: Vec<f64>,
    /// Mean silhouette per candidate, index `k - 1`; `None` for k = 1 or when
    /// undefined.
    pub silhouettes: Vec<Option<f64>>,
    /// Cluster count at the elbow of the inertia curve.
    pub elbow: Option<usize>,
    fits: Vec<KmeansFit>,
}

impl KScan {
    /// Largest candidate evaluated.
    pub fn max_k(&self) -> usize {
        self.fits.len()
    }

    /// Candidate with the highest silhouette coefficient.
    ///
    /// Diagnostic only; the clusterizator decides by the elbow.
    pub fn best_silhouette(&self) -> Option<usize> {
        self.silhouettes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i + 1, s)))
            .fold(None, |best: Option<(usize, f64)>, (k, s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((k, s)),
            })
            .map(|(k, _)| k)
    }

    /// The fit computed for `k`.
    pub fn fit(&self, k: usize) -> Option<&KmeansFit> {
        k.checked_sub(1).and_then(|i| self.fits.get(i))
    }

    fn into_fit(mut self, k: usize) -> Option<KmeansFit> {
        let i = k.checked_sub(1)?;
        (i < self.fits.len()).then(|| self.fits.swap_remove(i))
    }
}

/// Groups a drawing's ink points into digit-sized clusters.
#[derive(Debug, Clone)]
pub struct Clusterizator {
    points: PointSet,
    config: ClusterConfig,
}

impl Clusterizator {
    /// Cluster the given points with default settings.
    pub fn new(points: PointSet) -> Self {
        Self {
            points,
            config: ClusterConfig::default(),
        }
    }

    /// Extract the ink points of `image` and prepare to cluster them.
    pub fn from_image<I>(image: &I) -> Self
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        Self::new(PointExtractor::extract(image))
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Points, carrying their labels once clustering ran.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Active configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Consume the clusterizator, returning its points.
    pub fn into_points(self) -> PointSet {
        self.points
    }

    /// Partition the points into clusters.
    ///
    /// With `auto_detect` and `count > 1`, `count` is the largest cluster count
    /// tried and the elbow decides; otherwise exactly `count` clusters are
    /// built. No points, `count == 0`, or no elbow all give an empty
    /// collection.
    pub fn clusterize(&mut self, auto_detect: bool, count: usize) -> Result<ClusterCollection> {
        self.clusterize_with_progress(auto_detect, count, |_| {})
    }

    /// Like [`clusterize`](Self::clusterize), reporting auto-detection progress.
    ///
    /// `progress` receives a percentage after each candidate k is evaluated;
    /// it is not called in fixed-count mode.
    pub fn clusterize_with_progress<F>(
        &mut self,
        auto_detect: bool,
        count: usize,
        mut progress: F,
    ) -> Result<ClusterCollection>
    where
        F: FnMut(u8),
    {
        if self.points.is_empty() || count == 0 {
            tracing::debug!(n_points = self.points.len(), count, "nothing to cluster");
            return Ok(ClusterCollection::empty());
        }

        let features = StandardScaler::fit_transform(&self.points.features())?;

        let fit = if auto_detect && count > 1 {
            let max_k = count.min(features.nrows());
            let scan = self.scan_standardized(&features, max_k, &mut progress)?;
            let elbow = scan.elbow;
            match elbow {
                Some(k) => scan.into_fit(k).ok_or(Error::InvalidClusterCount {
                    requested: k,
                    n_items: max_k,
                })?,
                None => {
                    tracing::warn!(max_k, "elbow point not found");
                    return Ok(ClusterCollection::empty());
                }
            }
        } else {
            self.config.kmeans(count).fit(&features)?
        };

        tracing::info!(
            k = fit.k(),
            inertia = fit.inertia,
            n_iter = fit.n_iter,
            "clustered ink points"
        );
        tracing::debug!(centroids = ?fit.centroids, "final centroids");

        self.points.assign_labels(&fit.labels)?;
        ClusterCollection::from_labelled(self.points.points(), fit.k())
    }

    /// Evaluate every cluster count in `1..=max_k` on the standardized points.
    pub fn scan<F>(&self, max_k: usize, mut progress: F) -> Result<KScan>
    where
        F: FnMut(u8),
    {
        if self.points.is_empty() {
            return Err(Error::EmptyInput);
        }
        let features = StandardScaler::fit_transform(&self.points.features())?;
        self.scan_standardized(&features, max_k, &mut progress)
    }

    fn scan_standardized(
        &self,
        features: &Array2<f64>,
        max_k: usize,
        progress: &mut dyn FnMut(u8),
    ) -> Result<KScan> {
        let mut fits = Vec::with_capacity(max_k);
        let mut inertias = Vec::with_capacity(max_k);
        let mut silhouettes = Vec::with_capacity(max_k);

        for k in 1..=max_k {
            let fit = self.config.kmeans(k).fit(features)?;
            let silhouette = if k > 1 {
                silhouette_score(features, &fit.labels)
            } else {
                None
            };
            tracing::debug!(k, inertia = fit.inertia, ?silhouette, "precalculated k-means");

            inertias.push(fit.inertia);
            silhouettes.push(silhouette);
            fits.push(fit);
            progress((k * 100 / max_k) as u8);
        }

        let ks: Vec<f64> = (1..=max_k).map(|k| k as f64).collect();
        let elbow = KneeLocator::new(Curve::Convex, Direction::Decreasing)
            .with_sensitivity(self.config.sensitivity)
            .find(&ks, &inertias)
            .map(|i| i + 1);

        let scan = KScan {
            inertias,
            silhouettes,
            elbow,
            fits,
        };
        tracing::debug!(
            ?elbow,
            best_silhouette = ?scan.best_silhouette(),
            "cluster count scan finished"
        );
        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ari;
    use proptest::prelude::*;

    fn fast() -> ClusterConfig {
        ClusterConfig::default().with_n_init(10).with_max_iter(300)
    }

    /// Square blobs of `side`×`side` pixels, top-left corners at `origins`.
    fn blobs(origins: &[(i32, i32)], side: i32) -> PointSet {
        let mut set = PointSet::new();
        for &(ox, oy) in origins {
            for dy in 0..side {
                for dx in 0..side {
                    set.push(ox + dx, oy + dy);
                }
            }
        }
        set
    }

    #[test]
    fn test_two_separated_blobs_fixed_count() {
        let points: PointSet = [
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (2, 2),
            (100, 0),
            (101, 0),
            (100, 1),
            (101, 1),
            (102, 2),
        ]
        .into_iter()
        .collect();

        let mut c = Clusterizator::new(points).with_config(fast());
        let clusters = c.clusterize(false, 2).unwrap();

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.sizes(), vec![5, 5]);
        for group in clusters.iter() {
            let near = group.iter().all(|p| p.x() < 50);
            let far = group.iter().all(|p| p.x() >= 50);
            assert!(near || far, "cluster mixes both blobs");
        }
    }

    #[test]
    fn test_labels_written_back() {
        let mut c = Clusterizator::new(blobs(&[(0, 0), (60, 0)], 3)).with_config(fast());
        let clusters = c.clusterize(false, 2).unwrap();

        for (k, group) in clusters.iter().enumerate() {
            assert!(group.iter().all(|p| p.cluster() == Some(k)));
        }
        assert!(c.points().iter().all(|p| p.cluster().is_some()));
    }

    #[test]
    fn test_empty_points() {
        let mut c = Clusterizator::new(PointSet::new());
        assert!(c.clusterize(true, 10).unwrap().is_empty());
        assert!(c.clusterize(false, 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_count() {
        let mut c = Clusterizator::new(blobs(&[(0, 0)], 3));
        assert!(c.clusterize(true, 0).unwrap().is_empty());
        assert!(c.clusterize(false, 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_cluster_fixed() {
        let mut c = Clusterizator::new(blobs(&[(5, 5)], 2)).with_config(fast());
        let clusters = c.clusterize(true, 1).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.total_points(), 4);
    }

    #[test]
    fn test_single_point() {
        let points: PointSet = [(3, 4)].into_iter().collect();
        let mut c = Clusterizator::new(points).with_config(fast());
        let clusters = c.clusterize(false, 1).unwrap();
        assert_eq!(clusters.sizes(), vec![1]);
    }

    #[test]
    fn test_count_above_points_is_error() {
        let points: PointSet = [(0, 0), (1, 1)].into_iter().collect();
        let mut c = Clusterizator::new(points).with_config(fast());
        assert!(matches!(
            c.clusterize(false, 3),
            Err(Error::InvalidClusterCount { .. })
        ));
    }

    #[test]
    fn test_auto_detects_three_blobs() {
        let set = blobs(&[(0, 0), (60, 0), (30, 50)], 4);
        let truth: Vec<usize> = (0..48).map(|i| i / 16).collect();

        let mut c = Clusterizator::new(set).with_config(fast());
        let clusters = c.clusterize(true, 8).unwrap();
        assert_eq!(clusters.len(), 3);

        let labels: Vec<usize> = c.points().iter().filter_map(|p| p.cluster()).collect();
        assert!((ari(&labels, &truth) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_caps_candidates_at_point_count() {
        let points: PointSet = [(0, 0), (50, 50)].into_iter().collect();
        let mut c = Clusterizator::new(points).with_config(fast());
        let mut calls = Vec::new();
        // Two candidates only: too few for an elbow.
        let clusters = c.clusterize_with_progress(true, 10, |p| calls.push(p)).unwrap();
        assert!(clusters.is_empty());
        assert_eq!(calls, vec![50, 100]);
    }

    #[test]
    fn test_progress_is_monotonic_and_complete() {
        let mut c = Clusterizator::new(blobs(&[(0, 0), (30, 30)], 3)).with_config(fast());
        let mut calls = Vec::new();
        let _ = c.clusterize_with_progress(true, 6, |p| calls.push(p)).unwrap();

        assert_eq!(calls.len(), 6);
        assert!(calls.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(calls.last(), Some(&100));
    }

    #[test]
    fn test_no_progress_in_fixed_mode() {
        let mut c = Clusterizator::new(blobs(&[(0, 0), (30, 30)], 3)).with_config(fast());
        let mut called = false;
        let _ = c.clusterize_with_progress(false, 2, |_| called = true).unwrap();
        assert!(!called);
    }

    #[test]
    fn test_scan_reports_diagnostics() {
        let c = Clusterizator::new(blobs(&[(0, 0), (60, 0), (30, 50)], 4)).with_config(fast());
        let scan = c.scan(5, |_| {}).unwrap();

        assert_eq!(scan.max_k(), 5);
        assert_eq!(scan.inertias.len(), 5);
        assert_eq!(scan.silhouettes[0], None);
        assert!(scan.silhouettes[1..].iter().all(Option::is_some));
        assert_eq!(scan.best_silhouette(), Some(3));
        assert_eq!(scan.elbow, Some(3));
        assert!(scan.inertias[2] < scan.inertias[1]);
        assert!(scan.inertias[1] < scan.inertias[0]);
        assert_eq!(scan.fit(3).map(KmeansFit::k), Some(3));
        assert!(scan.fit(0).is_none());
    }

    #[test]
    fn test_collinear_points_zero_variance_column() {
        let points: PointSet = (0..10).map(|x| (x * 10, 7)).collect();
        let mut c = Clusterizator::new(points).with_config(fast());
        let clusters = c.clusterize(false, 2).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.total_points(), 10);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn clusterize_partitions_points(
            coords in proptest::collection::hash_set((0i32..64, 0i32..64), 1..40),
            k in 1usize..5,
        ) {
            let points: PointSet = coords.into_iter().collect();
            let n = points.len();
            prop_assume!(k <= n);

            let mut c = Clusterizator::new(points)
                .with_config(ClusterConfig::default().with_n_init(3).with_max_iter(100));
            let clusters = c.clusterize(false, k).unwrap();

            prop_assert_eq!(clusters.len(), k);
            prop_assert_eq!(clusters.total_points(), n);

            let mut seen = std::collections::HashSet::new();
            for (label, group) in clusters.iter().enumerate() {
                for p in group {
                    prop_assert_eq!(p.cluster(), Some(label));
                    prop_assert!(seen.insert((p.x(), p.y())));
                }
            }
            prop_assert_eq!(seen.len(), n);
        }
    }
}
