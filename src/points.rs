//! Ink points and the collections built from them.
//!
//! A [`PointSet`] is the index-aligned bridge between raster coordinates and
//! the numeric feature matrix fed to k-means: row `i` of
//! [`PointSet::features`] is always `points[i]`, and labels coming back from
//! clustering are written with [`PointSet::assign_labels`], which checks the
//! lengths agree. Nothing else may reorder the points.

use crate::error::{Error, Result};
use ndarray::Array2;

/// A foreground pixel of the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    x: i32,
    y: i32,
    cluster: Option<usize>,
}

impl Point {
    /// Create an unassigned point at `(x, y)`.
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            cluster: None,
        }
    }

    /// Column.
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Row.
    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Cluster this point was assigned to, `None` until clustering ran.
    #[inline]
    pub fn cluster(&self) -> Option<usize> {
        self.cluster
    }
}

/// Ordered ink points of one raster snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a point at `(x, y)`.
    pub fn push(&mut self, x: i32, y: i32) {
        self.points.push(Point::new(x, y));
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterate over the points in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// N×2 feature matrix, columns `(x, y)`, rows in insertion order.
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.points.len(), 2), |(i, j)| {
            let p = &self.points[i];
            if j == 0 {
                f64::from(p.x)
            } else {
                f64::from(p.y)
            }
        })
    }

    /// Write cluster labels back, `labels[i]` going to `points[i]`.
    pub fn assign_labels(&mut self, labels: &[usize]) -> Result<()> {
        if labels.len() != self.points.len() {
            return Err(Error::DimensionMismatch {
                expected: self.points.len(),
                found: labels.len(),
            });
        }
        for (point, &label) in self.points.iter_mut().zip(labels) {
            point.cluster = Some(label);
        }
        Ok(())
    }

    /// Consume the set, returning its points.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

impl FromIterator<(i32, i32)> for PointSet {
    fn from_iter<T: IntoIterator<Item = (i32, i32)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Per-digit groups produced by clustering.
///
/// Group `k` holds every point labelled `k`, in original scan order. All
/// groups `0..len()` are present even when some are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterCollection {
    clusters: Vec<Vec<Point>>,
}

impl ClusterCollection {
    /// A collection with no groups ("nothing to recognize").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bucket labelled points into `k` groups.
    ///
    /// Points must already carry their label; a point whose label is `None`
    /// or `>= k` is rejected.
    pub fn from_labelled(points: &[Point], k: usize) -> Result<Self> {
        let mut clusters = vec![Vec::new(); k];
        for p in points {
            match p.cluster {
                Some(label) if label < k => clusters[label].push(*p),
                Some(label) => {
                    return Err(Error::InvalidClusterCount {
                        requested: label + 1,
                        n_items: k,
                    })
                }
                None => {
                    return Err(Error::InvalidParameter {
                        name: "points",
                        message: "point has no cluster assignment",
                    })
                }
            }
        }
        Ok(Self { clusters })
    }

    /// Number of groups (K).
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Group `k`, if present.
    pub fn get(&self, k: usize) -> Option<&[Point]> {
        self.clusters.get(k).map(Vec::as_slice)
    }

    /// Iterate over the groups in label order.
    pub fn iter(&self) -> impl Iterator<Item = &[Point]> {
        self.clusters.iter().map(Vec::as_slice)
    }

    /// Total number of points over all groups.
    pub fn total_points(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }

    /// Group sizes in label order.
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Vec::len).collect()
    }

    /// Consume the collection, returning the raw groups.
    pub fn into_inner(self) -> Vec<Vec<Point>> {
        self.clusters
    }
}
