//! Knee / elbow detection with the Kneedle algorithm.
//!
//! Satopää et al. (2011), "Finding a 'Kneedle' in a Haystack: Detecting Knee
//! Points in System Behavior".
//!
//! Both axes are normalized to `[0, 1]` and the curve is flipped so that the
//! sought point becomes a maximum of the *difference curve* `y' - x'`. Walking
//! right from the first local maximum, a knee is declared as soon as the
//! difference curve drops below `max - S * mean(Δx')`. Reaching a local minimum
//! resets the threshold to 0. Offline mode: the first knee found is returned.
//!
//! For an inertia-vs-k curve (convex, decreasing) the knee is the elbow: the k
//! after which extra clusters stop paying for themselves.

/// Curvature of the input curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    /// Bends upwards (e.g. inertia vs k).
    #[default]
    Convex,
    /// Bends downwards.
    Concave,
}

/// Monotone direction of the input curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// y grows with x.
    Increasing,
    /// y shrinks with x.
    #[default]
    Decreasing,
}

/// Kneedle knee locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeLocator {
    curve: Curve,
    direction: Direction,
    sensitivity: f64,
}

impl Default for KneeLocator {
    fn default() -> Self {
        Self {
            curve: Curve::Convex,
            direction: Direction::Decreasing,
            sensitivity: 1.0,
        }
    }
}

impl KneeLocator {
    /// Locator for the given curve shape, sensitivity 1.0.
    pub fn new(curve: Curve, direction: Direction) -> Self {
        Self {
            curve,
            direction,
            ..Self::default()
        }
    }

    /// Set the sensitivity `S`; larger values demand a sharper bend.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Index into `x` of the first knee, or `None` when there is none.
    ///
    /// `x` must be strictly increasing. Fewer than three samples, mismatched
    /// lengths, or a flat axis never produce a knee.
    pub fn find(&self, x: &[f64], y: &[f64]) -> Option<usize> {
        let n = x.len();
        if n < 3 || y.len() != n {
            return None;
        }

        let x_norm = normalize(x)?;
        let y_norm = self.transform_y(normalize(y)?);

        let diff: Vec<f64> = y_norm.iter().zip(&x_norm).map(|(a, b)| a - b).collect();

        let maxima = rel_extrema(&diff, |a, b| a >= b);
        let minima = rel_extrema(&diff, |a, b| a <= b);
        let first_max = *maxima.first()?;

        let mean_step = x_norm.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (n - 1) as f64;
        let offset = self.sensitivity * mean_step.abs();

        let mut threshold = 0.0;
        let mut threshold_index = first_max;

        for i in first_max..n - 1 {
            if maxima.contains(&i) {
                threshold = diff[i] - offset;
                threshold_index = i;
            }
            if minima.contains(&i) {
                threshold = 0.0;
            }

            if diff[i + 1] < threshold {
                return Some(match (self.curve, self.direction) {
                    (Curve::Convex, Direction::Decreasing)
                    | (Curve::Concave, Direction::Increasing) => threshold_index,
                    _ => n - 1 - threshold_index,
                });
            }
        }

        None
    }

    /// Map every curve shape onto the concave-increasing case.
    fn transform_y(&self, y: Vec<f64>) -> Vec<f64> {
        let max = y.iter().copied().fold(f64::MIN, f64::max);
        match (self.curve, self.direction) {
            (Curve::Concave, Direction::Decreasing) => y.into_iter().rev().collect(),
            (Curve::Convex, Direction::Decreasing) => y.into_iter().map(|v| max - v).collect(),
            (Curve::Convex, Direction::Increasing) => {
                y.into_iter().rev().map(|v| max - v).collect()
            }
            (Curve::Concave, Direction::Increasing) => y,
        }
    }
}

/// Min-max normalize to `[0, 1]`; `None` for a flat or non-finite series.
fn normalize(v: &[f64]) -> Option<Vec<f64>> {
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return None;
    }
    Some(v.iter().map(|&a| (a - min) / range).collect())
}

/// Indices where `cmp` holds against both neighbours; endpoints compare
/// against themselves on the missing side.
fn rel_extrema(v: &[f64], cmp: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let last = v.len() - 1;
    (0..v.len())
        .filter(|&i| {
            let prev = v[i.saturating_sub(1)];
            let next = v[(i + 1).min(last)];
            cmp(v[i], prev) && cmp(v[i], next)
        })
        .collect()
}
