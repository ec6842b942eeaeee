//! Clustering quality measures.
//!
//! | Metric | Range | Best | Needs ground truth |
//! |--------|-------|------|--------------------|
//! | [`inertia`] | [0, ∞) | 0 | no |
//! | [`silhouette_score`] | [-1, 1] | 1 | no |
//! | [`ari`] | [-1, 1] | 1 | yes |
//!
//! Inertia always falls as k grows, which is why the cluster-count scan looks
//! for its elbow rather than its minimum. The silhouette coefficient peaks at
//! the "natural" k instead and is reported alongside the elbow as a second
//! opinion.
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation and
//!   validation of cluster analysis"
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use crate::cluster::Kmeans;
use ndarray::Array2;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Within-cluster sum of squared distances to the assigned centroid.
///
/// Returns `None` when `labels` does not match `data` or names a centroid that
/// does not exist.
pub fn inertia(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> Option<f64> {
    if labels.len() != data.nrows() || data.ncols() != centroids.ncols() {
        return None;
    }
    labels
        .iter()
        .enumerate()
        .map(|(i, &k)| {
            (k < centroids.nrows())
                .then(|| Kmeans::squared_distance(&data.row(i), &centroids.row(k)))
        })
        .sum()
}

/// Mean silhouette coefficient over all points.
///
/// For point i with mean intra-cluster distance `a` and smallest mean distance
/// to another cluster `b`:
///
/// ```text
/// s(i) = (b - a) / max(a, b)
/// ```
///
/// Points alone in their cluster score 0. Defined only when the number of
/// distinct labels is between 2 and N - 1; `None` otherwise.
///
/// O(N²) distance evaluations.
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let n = data.nrows();
    if labels.len() != n || n == 0 {
        return None;
    }

    // Dense relabelling so per-cluster sums fit in a Vec.
    let mut dense: HashMap<usize, usize> = HashMap::new();
    for &l in labels {
        let next = dense.len();
        dense.entry(l).or_insert(next);
    }
    let n_labels = dense.len();
    if n_labels < 2 || n_labels > n - 1 {
        return None;
    }

    let ids: Vec<usize> = labels.iter().map(|l| dense[l]).collect();
    let mut sizes = vec![0usize; n_labels];
    for &c in &ids {
        sizes[c] += 1;
    }

    let sample = |i: usize| -> f64 {
        let own = ids[i];
        if sizes[own] < 2 {
            return 0.0;
        }
        let mut sums = vec![0.0f64; n_labels];
        let row = data.row(i);
        for j in 0..n {
            if j != i {
                sums[ids[j]] += Kmeans::squared_distance(&row, &data.row(j)).sqrt();
            }
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_labels)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            (b - a) / denom
        } else {
            0.0
        }
    };

    #[cfg(feature = "parallel")]
    let total: f64 = (0..n).into_par_iter().map(sample).sum();

    #[cfg(not(feature = "parallel"))]
    let total: f64 = (0..n).map(sample).sum();

    Some(total / n as f64)
}

/// Adjusted Rand Index between two clusterings.
///
/// ARI is the corrected-for-chance version of the Rand Index and is invariant
/// to label permutation. 0 indicates random agreement, 1 identical partitions.
///
/// ```rust
/// use inkdigits::metrics::ari;
///
/// let pred = [1, 1, 0, 0];
/// let truth = [0, 0, 1, 1];
/// assert!((ari(&pred, &truth) - 1.0).abs() < 0.01);
/// ```
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let (joint, n) = build_contingency_table(pred, truth);

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();

    for (&(p, t), &count) in &joint {
        *row_sums.entry(p).or_insert(0usize) += count;
        *col_sums.entry(t).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&b| comb2(b) as f64).sum();

    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }

    (sum_comb_ij - expected) / denom
}

fn build_contingency_table(
    pred: &[usize],
    truth: &[usize],
) -> (HashMap<(usize, usize), usize>, usize) {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    (table, pred.len())
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}
