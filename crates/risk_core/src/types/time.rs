//! Simulation time grids.
//!
//! A [`TimeGrid`] is an ordered set of horizon points in year fractions.
//! Every simulated path and every exposure profile is aligned 1:1 with a
//! grid, so the grid is validated once at construction and then treated as
//! immutable.

use thiserror::Error;

/// Errors raised by [`TimeGrid`] construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeGridError {
    /// The grid contains no points.
    #[error("time grid must contain at least one point")]
    Empty,

    /// The first grid point is negative.
    #[error("time grid must start at or after zero, got {0}")]
    NegativeStart(f64),

    /// A grid point is not strictly greater than its predecessor.
    #[error("time grid must be strictly increasing at index {index}: {previous} >= {current}")]
    NotIncreasing {
        /// Index of the offending point.
        index: usize,
        /// Value of the preceding point.
        previous: f64,
        /// Value of the offending point.
        current: f64,
    },

    /// A grid point is NaN or infinite.
    #[error("time grid point at index {index} is not finite")]
    NotFinite {
        /// Index of the offending point.
        index: usize,
    },

    /// `regular()` was asked for zero steps or a non-positive horizon.
    #[error("regular grid requires a positive horizon and at least one step, got horizon {horizon}, steps {steps}")]
    InvalidRegular {
        /// Requested horizon in year fractions.
        horizon: f64,
        /// Requested number of steps.
        steps: usize,
    },
}

/// An ordered, strictly increasing set of horizon points (year fractions).
///
/// The first point may be zero (valuation date). Grids are cheap to clone
/// and compare; path sets and exposure profiles carry them for alignment.
///
/// # Examples
/// ```
/// use risk_core::TimeGrid;
///
/// let grid = TimeGrid::new(vec![0.25, 0.5, 1.0]).unwrap();
/// assert_eq!(grid.len(), 3);
/// assert_eq!(grid.horizon(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Creates a validated time grid.
    ///
    /// # Errors
    /// Returns [`TimeGridError`] if the points are empty, non-finite,
    /// start below zero, or are not strictly increasing.
    pub fn new(times: Vec<f64>) -> Result<Self, TimeGridError> {
        if times.is_empty() {
            return Err(TimeGridError::Empty);
        }
        for (index, &t) in times.iter().enumerate() {
            if !t.is_finite() {
                return Err(TimeGridError::NotFinite { index });
            }
        }
        if times[0] < 0.0 {
            return Err(TimeGridError::NegativeStart(times[0]));
        }
        for index in 1..times.len() {
            if times[index] <= times[index - 1] {
                return Err(TimeGridError::NotIncreasing {
                    index,
                    previous: times[index - 1],
                    current: times[index],
                });
            }
        }
        Ok(Self { times })
    }

    /// Creates a regular grid of `steps` equal intervals over `(0, horizon]`.
    ///
    /// The valuation point `t = 0` is not included; the first point is
    /// `horizon / steps` and the last is `horizon`.
    ///
    /// # Errors
    /// Returns [`TimeGridError::InvalidRegular`] for a non-positive horizon
    /// or zero steps.
    pub fn regular(horizon: f64, steps: usize) -> Result<Self, TimeGridError> {
        if steps == 0 || !horizon.is_finite() || horizon <= 0.0 {
            return Err(TimeGridError::InvalidRegular { horizon, steps });
        }
        let dt = horizon / steps as f64;
        let times = (1..=steps).map(|i| i as f64 * dt).collect();
        Self::new(times)
    }

    /// Returns the grid points as a slice.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Returns the number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always `false`; a grid holds at least one point by construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the grid point at `index`, if in range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// Returns the last grid point (the overall horizon).
    #[inline]
    pub fn horizon(&self) -> f64 {
        *self.times.last().expect("grid is non-empty by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_accepts_increasing_grid() {
        let grid = TimeGrid::new(vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.get(0), Some(0.0));
        assert_eq!(grid.horizon(), 1.0);
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(TimeGrid::new(vec![]), Err(TimeGridError::Empty));
    }

    #[test]
    fn test_new_rejects_negative_start() {
        assert_eq!(
            TimeGrid::new(vec![-0.1, 0.5]),
            Err(TimeGridError::NegativeStart(-0.1))
        );
    }

    #[test]
    fn test_new_rejects_non_increasing() {
        let err = TimeGrid::new(vec![0.0, 0.5, 0.5]).unwrap_err();
        assert!(matches!(err, TimeGridError::NotIncreasing { index: 2, .. }));
    }

    #[test]
    fn test_new_rejects_nan() {
        let err = TimeGrid::new(vec![0.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, TimeGridError::NotFinite { index: 1 }));
    }

    #[test]
    fn test_regular_grid() {
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        assert_eq!(grid.len(), 4);
        assert_relative_eq!(grid.times()[0], 0.25);
        assert_relative_eq!(grid.horizon(), 1.0);
    }

    #[test]
    fn test_regular_rejects_zero_steps() {
        assert!(matches!(
            TimeGrid::regular(1.0, 0),
            Err(TimeGridError::InvalidRegular { .. })
        ));
    }

    #[test]
    fn test_regular_rejects_negative_horizon() {
        assert!(matches!(
            TimeGrid::regular(-1.0, 10),
            Err(TimeGridError::InvalidRegular { .. })
        ));
    }
}
