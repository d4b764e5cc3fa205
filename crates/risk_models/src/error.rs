//! Model and correlation error types.

use risk_core::RiskFactorId;
use thiserror::Error;

/// Errors raised by model parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Initial level (spot or rate) must be strictly positive for
    /// level-driven models.
    #[error("invalid initial level: {0} (must be positive)")]
    InvalidInitialLevel(f64),

    /// Volatility must be non-negative.
    #[error("invalid volatility: {0} (must be non-negative)")]
    InvalidVolatility(f64),

    /// Mean-reversion speed must be non-negative (strictly positive where
    /// the model's transition requires it).
    #[error("invalid mean reversion speed: {0}")]
    InvalidMeanReversion(f64),

    /// Variance (initial or long-run) must be non-negative.
    #[error("invalid variance: {0} (must be non-negative)")]
    InvalidVariance(f64),

    /// Correlation must lie in [-1, 1].
    #[error("invalid correlation: {0} (must be in [-1, 1])")]
    InvalidCorrelation(f64),

    /// A parameter is NaN or infinite.
    #[error("parameter `{0}` is not finite")]
    NotFinite(&'static str),
}

/// Errors raised by correlation matrix validation and factorisation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// Entry count does not match the declared factor count.
    #[error("correlation data length {got} does not match {dim} x {dim} factors")]
    DimensionMismatch {
        /// Number of declared factors.
        dim: usize,
        /// Number of entries supplied.
        got: usize,
    },

    /// No factors were supplied.
    #[error("correlation matrix requires at least one factor")]
    Empty,

    /// The same factor id appears more than once.
    #[error("duplicate factor id: {0}")]
    DuplicateFactor(RiskFactorId),

    /// A diagonal entry is not 1.
    #[error("diagonal entry at index {index} must be 1.0, got {value}")]
    InvalidDiagonal {
        /// Row/column index of the entry.
        index: usize,
        /// Observed value.
        value: f64,
    },

    /// The matrix is not symmetric.
    #[error("matrix not symmetric at ({row}, {col}): {value} != {transposed}")]
    NotSymmetric {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Entry at (row, col).
        value: f64,
        /// Entry at (col, row).
        transposed: f64,
    },

    /// An off-diagonal entry is outside [-1, 1] or not finite.
    #[error("entry at ({row}, {col}) out of range: {value} (must be in [-1, 1])")]
    OutOfRange {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Observed value.
        value: f64,
    },

    /// Cholesky factorisation failed; the matrix is not positive definite.
    #[error("matrix is not positive definite (pivot {pivot} at index {index})")]
    NotPositiveDefinite {
        /// Index of the failing pivot.
        index: usize,
        /// Value of the failing pivot.
        pivot: f64,
    },

    /// Nearest-PSD repair would move the matrix further than the caller's
    /// tolerance allows.
    #[error(
        "PSD repair adjustment {adjustment} exceeds tolerance {tolerance}"
    )]
    RepairExceedsTolerance {
        /// Largest absolute entry change the repair would introduce.
        adjustment: f64,
        /// Caller-supplied tolerance.
        tolerance: f64,
    },
}
