//! Revaluation bridge seam.
//!
//! Pricing lives outside this engine. The aggregator hands every
//! (position, scenario) pair to a [`RevaluationBridge`] and consumes the
//! monetary value it returns; quantity scaling is the bridge's business so
//! that nonlinear position effects stay expressible.

use thiserror::Error;

use crate::market::MarketSnapshot;
use crate::portfolio::Position;
use crate::scenarios::Scenario;

/// Failure reported by a pricing implementation.
///
/// The aggregator wraps this with the position id and scenario index
/// before surfacing it as a `MetricError`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RevaluationError {
    /// Human-readable reason from the pricing side.
    pub message: String,
}

impl RevaluationError {
    /// Creates a revaluation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Values positions under scenarios.
///
/// Implementations must be pure functions of their inputs (no hidden
/// state that varies between calls) and `Sync`, because the aggregator
/// fans scenarios out over rayon. The returned value is the position's
/// total monetary value under the scenario, quantity included.
pub trait RevaluationBridge: Sync {
    /// Values `position` under `scenario`, with `market` supplying any
    /// base levels the scenario does not override.
    ///
    /// # Errors
    /// [`RevaluationError`] when the position cannot be valued (missing
    /// factor, unsupported instrument, numerical failure downstream).
    fn value(
        &self,
        position: &Position,
        scenario: &Scenario,
        market: &dyn MarketSnapshot,
    ) -> Result<f64, RevaluationError>;
}
