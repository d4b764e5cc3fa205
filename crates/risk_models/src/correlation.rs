//! Cross-factor correlation structure.
//!
//! [`FactorCorrelation`] validates a dense correlation matrix keyed by
//! ordered risk factor ids and produces the lower-triangular Cholesky
//! factor the joint sampler uses to correlate primary Brownian draws.
//!
//! Near-PSD inputs (a common artefact of estimating pairwise correlations
//! from unaligned histories) are repaired by eigenvalue clipping: a Jacobi
//! eigendecomposition, negative eigenvalues floored at a small positive
//! value, reconstruction, and a diagonal rescale back to unit diagonal.
//! The repair is accepted only when the largest entry adjustment stays
//! within the caller's tolerance.

use crate::error::CorrelationError;
use risk_core::RiskFactorId;

/// Tolerance for symmetry and unit-diagonal validation.
const VALIDATION_TOL: f64 = 1e-10;

/// Cholesky pivots at or below this are treated as non-positive-definite.
const PIVOT_TOL: f64 = 1e-12;

/// Floor applied to clipped eigenvalues so the repaired matrix is strictly
/// positive definite, not merely semi-definite.
const EIGENVALUE_FLOOR: f64 = 1e-10;

/// Convergence threshold on the off-diagonal Frobenius norm of the Jacobi
/// sweep.
const JACOBI_TOL: f64 = 1e-14;

/// Maximum Jacobi sweeps; correlation matrices of practical dimension
/// converge in well under ten.
const JACOBI_MAX_SWEEPS: usize = 100;

/// A validated correlation matrix over an ordered set of risk factors.
///
/// # Examples
/// ```
/// use risk_core::RiskFactorId;
/// use risk_models::FactorCorrelation;
///
/// let ids = vec![RiskFactorId::new("EURUSD"), RiskFactorId::new("GBPUSD")];
/// let corr = FactorCorrelation::new(ids, vec![1.0, 0.6, 0.6, 1.0]).unwrap();
/// assert_eq!(corr.dim(), 2);
/// assert_eq!(corr.get(0, 1), 0.6);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactorCorrelation {
    ids: Vec<RiskFactorId>,
    /// Row-major `dim * dim` entries.
    data: Vec<f64>,
}

impl FactorCorrelation {
    /// Creates a validated correlation matrix.
    ///
    /// `data` is row-major with `ids.len() * ids.len()` entries. The order
    /// of `ids` fixes the row/column order and must match the order in
    /// which the sampler lays out primary draws.
    ///
    /// # Errors
    /// Rejects empty or duplicate factor ids, shape mismatches,
    /// non-finite or out-of-range entries, a non-unit diagonal, and
    /// asymmetry. Positive definiteness is checked later, at
    /// factorisation time.
    pub fn new(ids: Vec<RiskFactorId>, data: Vec<f64>) -> Result<Self, CorrelationError> {
        if ids.is_empty() {
            return Err(CorrelationError::Empty);
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(CorrelationError::DuplicateFactor(id.clone()));
            }
        }
        let dim = ids.len();
        if data.len() != dim * dim {
            return Err(CorrelationError::DimensionMismatch {
                dim,
                got: data.len(),
            });
        }
        for row in 0..dim {
            for col in 0..dim {
                let value = data[row * dim + col];
                if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                    return Err(CorrelationError::OutOfRange { row, col, value });
                }
            }
        }
        for index in 0..dim {
            let value = data[index * dim + index];
            if (value - 1.0).abs() > VALIDATION_TOL {
                return Err(CorrelationError::InvalidDiagonal { index, value });
            }
        }
        for row in 0..dim {
            for col in (row + 1)..dim {
                let value = data[row * dim + col];
                let transposed = data[col * dim + row];
                if (value - transposed).abs() > VALIDATION_TOL {
                    return Err(CorrelationError::NotSymmetric {
                        row,
                        col,
                        value,
                        transposed,
                    });
                }
            }
        }
        Ok(Self { ids, data })
    }

    /// The identity correlation (independent factors).
    pub fn identity(ids: Vec<RiskFactorId>) -> Result<Self, CorrelationError> {
        let dim = ids.len();
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self::new(ids, data)
    }

    /// Number of factors.
    #[inline]
    pub fn dim(&self) -> usize {
        self.ids.len()
    }

    /// Factor ids in row/column order.
    #[inline]
    pub fn ids(&self) -> &[RiskFactorId] {
        &self.ids
    }

    /// Entry at (`row`, `col`).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dim() + col]
    }

    /// Row/column index of `id`, if it is one of the factors.
    pub fn index_of(&self, id: &RiskFactorId) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// Plain Cholesky factorisation.
    ///
    /// # Errors
    /// [`CorrelationError::NotPositiveDefinite`] when a pivot drops to or
    /// below the numerical floor.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CorrelationError> {
        let dim = self.dim();
        let mut lower = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..=i {
                let mut sum = self.get(i, j);
                for k in 0..j {
                    sum -= lower[i * dim + k] * lower[j * dim + k];
                }
                if i == j {
                    if sum <= PIVOT_TOL {
                        return Err(CorrelationError::NotPositiveDefinite {
                            index: i,
                            pivot: sum,
                        });
                    }
                    lower[i * dim + j] = sum.sqrt();
                } else {
                    lower[i * dim + j] = sum / lower[j * dim + j];
                }
            }
        }
        Ok(CholeskyFactor { dim, lower })
    }

    /// Cholesky factorisation with nearest-PSD repair as fallback.
    ///
    /// A matrix that fails the plain factorisation is repaired by
    /// eigenvalue clipping; the repair is accepted when the largest entry
    /// adjustment it introduces is at most `tolerance`.
    ///
    /// # Errors
    /// [`CorrelationError::RepairExceedsTolerance`] when the matrix is too
    /// far from PSD, or any error of [`cholesky`](Self::cholesky) if the
    /// repaired matrix still fails (which indicates a degenerate input).
    pub fn factor(&self, tolerance: f64) -> Result<CholeskyFactor, CorrelationError> {
        match self.cholesky() {
            Ok(factor) => Ok(factor),
            Err(CorrelationError::NotPositiveDefinite { .. }) => {
                self.nearest_psd(tolerance)?.cholesky()
            }
            Err(err) => Err(err),
        }
    }

    /// Nearest-PSD repair by eigenvalue clipping.
    ///
    /// Negative eigenvalues are floored at a small positive value, the
    /// matrix is reconstructed and rescaled back to a unit diagonal, and
    /// the largest resulting entry change is compared against `tolerance`.
    pub fn nearest_psd(&self, tolerance: f64) -> Result<Self, CorrelationError> {
        let dim = self.dim();
        let (eigenvalues, eigenvectors) = jacobi_eigen(self.data.clone(), dim);

        // Reconstruct V * max(lambda, floor) * V^T.
        let clipped: Vec<f64> = eigenvalues
            .iter()
            .map(|&lambda| lambda.max(EIGENVALUE_FLOOR))
            .collect();
        let mut repaired = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                let mut sum = 0.0;
                for k in 0..dim {
                    sum += eigenvectors[i * dim + k] * clipped[k] * eigenvectors[j * dim + k];
                }
                repaired[i * dim + j] = sum;
            }
        }

        // Rescale to a unit diagonal; the clipped reconstruction has a
        // strictly positive diagonal.
        let scales: Vec<f64> = (0..dim)
            .map(|i| 1.0 / repaired[i * dim + i].sqrt())
            .collect();
        let mut adjustment: f64 = 0.0;
        for i in 0..dim {
            for j in 0..dim {
                let value = if i == j {
                    1.0
                } else {
                    (repaired[i * dim + j] * scales[i] * scales[j]).clamp(-1.0, 1.0)
                };
                adjustment = adjustment.max((value - self.get(i, j)).abs());
                repaired[i * dim + j] = value;
            }
        }
        // Exact symmetry after the clamp.
        for i in 0..dim {
            for j in (i + 1)..dim {
                let mean = 0.5 * (repaired[i * dim + j] + repaired[j * dim + i]);
                repaired[i * dim + j] = mean;
                repaired[j * dim + i] = mean;
            }
        }

        if adjustment > tolerance {
            return Err(CorrelationError::RepairExceedsTolerance {
                adjustment,
                tolerance,
            });
        }
        Self::new(self.ids.clone(), repaired)
    }
}

/// Lower-triangular Cholesky factor of a correlation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    dim: usize,
    /// Row-major `dim * dim`, upper triangle zero.
    lower: Vec<f64>,
}

impl CholeskyFactor {
    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry at (`row`, `col`); zero above the diagonal.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.lower[row * self.dim + col]
    }

    /// Correlates a vector of independent standard normals in place.
    ///
    /// `draws[i]` becomes `sum_{j <= i} L[i][j] * draws[j]`. Processing
    /// rows from the bottom up lets the transform run without a scratch
    /// buffer.
    ///
    /// # Panics
    /// Debug-asserts `draws.len() == dim()`.
    pub fn correlate(&self, draws: &mut [f64]) {
        debug_assert_eq!(draws.len(), self.dim);
        for i in (0..self.dim).rev() {
            let mut sum = 0.0;
            for j in 0..=i {
                sum += self.lower[i * self.dim + j] * draws[j];
            }
            draws[i] = sum;
        }
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns the eigenvalues and the row-major eigenvector matrix (columns
/// are eigenvectors, matching the eigenvalue order).
fn jacobi_eigen(mut a: Vec<f64>, dim: usize) -> (Vec<f64>, Vec<f64>) {
    let mut v = vec![0.0; dim * dim];
    for i in 0..dim {
        v[i * dim + i] = 1.0;
    }

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        for i in 0..dim {
            for j in (i + 1)..dim {
                off += a[i * dim + j] * a[i * dim + j];
            }
        }
        if off < JACOBI_TOL {
            break;
        }

        for p in 0..dim {
            for q in (p + 1)..dim {
                let apq = a[p * dim + q];
                if apq.abs() < f64::EPSILON {
                    continue;
                }
                let theta = (a[q * dim + q] - a[p * dim + p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A <- A * G
                for k in 0..dim {
                    let akp = a[k * dim + p];
                    let akq = a[k * dim + q];
                    a[k * dim + p] = c * akp - s * akq;
                    a[k * dim + q] = s * akp + c * akq;
                }
                // A <- G^T * A
                for k in 0..dim {
                    let apk = a[p * dim + k];
                    let aqk = a[q * dim + k];
                    a[p * dim + k] = c * apk - s * aqk;
                    a[q * dim + k] = s * apk + c * aqk;
                }
                // V <- V * G
                for k in 0..dim {
                    let vkp = v[k * dim + p];
                    let vkq = v[k * dim + q];
                    v[k * dim + p] = c * vkp - s * vkq;
                    v[k * dim + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..dim).map(|i| a[i * dim + i]).collect();
    (eigenvalues, v)
}
