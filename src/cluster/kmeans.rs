//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS, reported as `inertia`).
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids (random data points, or k-means++)
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until assignments stop changing, centroids stop moving, or the
//!    iteration cap is hit
//!
//! Lloyd only finds a local minimum, so [`Kmeans::fit`] runs `n_init`
//! independent initializations and keeps the one with the lowest inertia.
//! Restart seeds are drawn up front from the master seed, so the chosen run is
//! the same whether restarts execute sequentially or on the rayon pool.
//!
//! Equidistant points go to the lower-indexed centroid.

use super::traits::Clustering;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Centroid initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KmeansInit {
    /// k distinct data points chosen uniformly at random.
    #[default]
    Random,
    /// k-means++ seeding (D² sampling).
    PlusPlus,
}

/// Outcome of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster label per input row.
    pub labels: Vec<usize>,
    /// Final centroids, k×d.
    pub centroids: Array2<f64>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning restart.
    pub n_iter: usize,
}

impl KmeansFit {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations per restart.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Independent initializations.
    n_init: usize,
    /// Initialization strategy.
    init: KmeansInit,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            init: KmeansInit::Random,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the initialization strategy.
    pub fn with_init(mut self, init: KmeansInit) -> Self {
        self.init = init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit and return labels, centroids and inertia of the best restart.
    pub fn fit(&self, data: &Array2<f64>) -> Result<KmeansFit> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "at least one initialization is required",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "at least one iteration is required",
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let seeds: Vec<u64> = (0..self.n_init).map(|_| rng.next_u64()).collect();

        #[cfg(feature = "parallel")]
        let runs: Vec<KmeansFit> = seeds
            .par_iter()
            .map(|&s| self.run_once(data, &mut StdRng::seed_from_u64(s)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let runs: Vec<KmeansFit> = seeds
            .iter()
            .map(|&s| self.run_once(data, &mut StdRng::seed_from_u64(s)))
            .collect();

        // Earliest restart wins ties.
        runs.into_iter()
            .reduce(|best, run| if run.inertia < best.inertia { run } else { best })
            .ok_or(Error::EmptyInput)
    }

    /// One Lloyd run from a fresh initialization.
    fn run_once(&self, data: &Array2<f64>, rng: &mut StdRng) -> KmeansFit {
        let n = data.nrows();
        let d = data.ncols();

        let mut centroids = match self.init {
            KmeansInit::Random => self.init_random(data, rng),
            KmeansInit::PlusPlus => self.init_plus_plus(data, rng),
        };
        let mut labels = vec![usize::MAX; n];
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            let changed = Self::assign(data, &centroids, &mut labels);
            if !changed {
                break;
            }

            // Update step
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];

            for (i, &k) in labels.iter().enumerate() {
                for j in 0..d {
                    new_centroids[[k, j]] += data[[i, j]];
                }
                counts[k] += 1;
            }

            for k in 0..self.k {
                if counts[k] > 0 {
                    for j in 0..d {
                        new_centroids[[k, j]] /= counts[k] as f64;
                    }
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol {
                Self::assign(data, &centroids, &mut labels);
                break;
            }
        }

        // The cap may be hit right after an update.
        if n_iter == self.max_iter {
            Self::assign(data, &centroids, &mut labels);
        }

        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| Self::squared_distance(&data.row(i), &centroids.row(k)))
            .sum();

        KmeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }

    /// Assign every row to its nearest centroid; returns whether any label changed.
    fn assign(data: &Array2<f64>, centroids: &Array2<f64>, labels: &mut [usize]) -> bool {
        let mut changed = false;
        for (i, label) in labels.iter_mut().enumerate() {
            let point = data.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f64::MAX;

            for (k, centroid) in centroids.rows().into_iter().enumerate() {
                let dist = Self::squared_distance(&point, &centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            if *label != best_cluster {
                *label = best_cluster;
                changed = true;
            }
        }
        changed
    }

    /// Pick k distinct rows uniformly at random.
    fn init_random(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let indices = rand::seq::index::sample(rng, data.nrows(), self.k);
        let mut centroids = Array2::zeros((self.k, data.ncols()));
        for (c, idx) in indices.iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(idx));
        }
        centroids
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_plus_plus(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((self.k, data.ncols()));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f64> = (0..n)
                .map(|j| {
                    let point = data.row(j);
                    (0..i)
                        .map(|c| Self::squared_distance(&point, &centroids.row(c)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Sample proportional to squared distance
            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;

            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    /// Compute squared Euclidean distance.
    #[inline]
    pub(crate) fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
