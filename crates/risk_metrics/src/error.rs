//! Scenario and metric error types.

use risk_core::{NettingSetId, PositionId, RiskFactorId};
use risk_simulation::SimulationError;
use thiserror::Error;

use crate::reval::RevaluationError;

/// Errors raised while building scenario sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// Historical construction needs more observation periods.
    #[error("insufficient historical data: {actual} return periods, {required} required")]
    InsufficientData {
        /// Minimum number of return periods required.
        required: usize,
        /// Periods actually available.
        actual: usize,
    },

    /// The observed series of the factors have different lengths.
    #[error("series length mismatch for factor `{factor}`: expected {expected}, got {got}")]
    SeriesLengthMismatch {
        /// The misaligned factor.
        factor: RiskFactorId,
        /// Expected observation count.
        expected: usize,
        /// Observed count.
        got: usize,
    },

    /// A factor referenced on one side (levels, series, shocks) is missing
    /// on the other.
    #[error("unknown risk factor: {0}")]
    UnknownFactor(RiskFactorId),

    /// Log returns require strictly positive observations.
    #[error("non-positive observation for factor `{factor}` at index {index}")]
    NonPositiveObservation {
        /// The offending factor.
        factor: RiskFactorId,
        /// Index into the observed series.
        index: usize,
    },

    /// An explicit weight vector is unusable.
    #[error("invalid scenario weights: {reason}")]
    InvalidWeights {
        /// What is wrong with the weights.
        reason: &'static str,
    },

    /// Monte Carlo construction over path sets found inconsistent inputs.
    #[error("path sets disagree on {what} (factor `{factor}`)")]
    PathSetMismatch {
        /// Which property disagrees ("grid" or "path count").
        what: &'static str,
        /// The factor whose path set disagrees with the first one.
        factor: RiskFactorId,
    },

    /// A requested time index lies outside the grid.
    #[error("time index {index} outside grid of length {grid_len}")]
    TimeIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Grid length.
        grid_len: usize,
    },

    /// No inputs were supplied (no path sets, no shock sets, no factors).
    #[error("scenario construction requires at least one {0}")]
    EmptyInput(&'static str),

    /// Scenario weights of a pooled set do not sum to one.
    #[error("scenario weights sum to {sum} at time index {time_index:?} (expected 1 within 1e-9)")]
    WeightSumMismatch {
        /// Time slice checked, if the set is time-indexed.
        time_index: Option<usize>,
        /// Observed weight sum.
        sum: f64,
    },
}

/// Errors raised by metric computation and the high-level drivers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// Confidence levels live in the open interval (0, 1).
    #[error("invalid confidence level: {0} (must be in (0, 1))")]
    InvalidConfidence(f64),

    /// Horizons must be strictly positive.
    #[error("invalid horizon: {0} (must be positive)")]
    InvalidHorizon(f64),

    /// Too few samples to resolve the requested tail.
    ///
    /// A quantile at confidence `c` needs `n * (1 - c) >= 1` effective
    /// tail mass.
    #[error("insufficient sample: {actual} samples cannot resolve the tail at confidence {confidence}")]
    InsufficientSample {
        /// Requested confidence level.
        confidence: f64,
        /// Samples available.
        actual: usize,
    },

    /// A metric input distribution is empty.
    #[error("empty exposure distribution for netting set {netting_set:?} at time index {time_index:?}")]
    EmptyDistribution {
        /// Netting set, when the distribution is per-set.
        netting_set: Option<NettingSetId>,
        /// Time index, when the distribution is time-indexed.
        time_index: Option<usize>,
    },

    /// Horizon points of a profile must be strictly increasing.
    #[error("non-monotonic profile: time {current} at position {position} does not exceed {previous}")]
    NonMonotonicProfile {
        /// Position in the profile.
        position: usize,
        /// Preceding time.
        previous: f64,
        /// Offending time.
        current: f64,
    },

    /// The pricing bridge failed for one position under one scenario.
    #[error("revaluation failed for position `{position}` in scenario {scenario_index}: {source}")]
    Revaluation {
        /// Position being revalued.
        position: PositionId,
        /// Index of the scenario within its set.
        scenario_index: usize,
        /// Underlying bridge error.
        source: RevaluationError,
    },

    /// Scenario construction failed inside a driver.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Simulation failed inside a driver.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// The run was aborted through a `CancellationToken`.
    #[error("metric computation cancelled")]
    Cancelled,
}
