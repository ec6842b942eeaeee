//! Feature standardization.
//!
//! Each column is shifted to zero mean and divided by its population standard
//! deviation, so x and y contribute equally to k-means distances whatever the
//! drawing's aspect ratio. A constant column gets scale 1, which maps every
//! value to 0.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Per-column mean/std scaler, fitted once and applied to the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column statistics.
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(Error::EmptyInput);
        }
        let mean = data.mean_axis(Axis(0)).ok_or(Error::EmptyInput)?;
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        Ok(Self { mean, scale })
    }

    /// Standardize `data` with the fitted statistics.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(Error::DimensionMismatch {
                expected: self.mean.len(),
                found: data.ncols(),
            });
        }
        Ok((data - &self.mean) / &self.scale)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(data: &Array2<f64>) -> Result<Array2<f64>> {
        Self::fit(data)?.transform(data)
    }

    /// Column means.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Column divisors (population std, or 1 for constant columns).
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zero_mean_unit_variance() {
        let data = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let z = StandardScaler::fit_transform(&data).unwrap();

        for col in z.columns() {
            let mean = col.mean().unwrap();
            let var = col.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12, "population variance should be 1");
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let data = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let z = StandardScaler::fit_transform(&data).unwrap();
        assert!(z.column(0).iter().all(|&v| v == 0.0));
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_row() {
        let data = array![[7.0, 3.0]];
        let z = StandardScaler::fit_transform(&data).unwrap();
        assert_eq!(z, array![[0.0, 0.0]]);
    }

    #[test]
    fn test_empty_is_error() {
        let data = Array2::<f64>::zeros((0, 2));
        assert_eq!(StandardScaler::fit(&data), Err(Error::EmptyInput));
    }
}
