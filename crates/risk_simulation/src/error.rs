//! Simulation error types.

use risk_core::RiskFactorId;
use risk_models::{CorrelationError, ModelError};
use thiserror::Error;

/// Errors raised by the simulator and the joint sampler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A model parameter failed validation.
    #[error("invalid model parameter: {0}")]
    InvalidParameter(#[from] ModelError),

    /// Correlation validation, factorisation or repair failed.
    #[error("correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// At least one path is required.
    #[error("invalid path count: {0} (must be at least 1)")]
    InvalidPathCount(usize),

    /// The joint sampler was given no models.
    #[error("joint sampling requires at least one model")]
    EmptyModelSet,

    /// The correlation matrix and the model map disagree on the factor set.
    #[error("factor `{factor}` present in {present_in} but missing from {missing_from}")]
    FactorMismatch {
        /// The factor that appears on one side only.
        factor: RiskFactorId,
        /// Where the factor was found.
        present_in: &'static str,
        /// Where it was expected.
        missing_from: &'static str,
    },

    /// The run was aborted through a `CancellationToken`.
    #[error("simulation cancelled")]
    Cancelled,
}
