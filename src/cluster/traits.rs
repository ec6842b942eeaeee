//! Clustering traits.

use crate::error::Result;
use ndarray::Array2;

/// Trait for hard clustering algorithms over an N×d feature matrix.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per row of `data`, in row order.
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
