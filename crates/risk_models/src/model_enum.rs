//! Closed sum type over the supported stochastic models.
//!
//! Enum-based static dispatch keeps the per-step call in the simulator's
//! hot loop free of virtual calls and lets the compiler inline the kernel
//! for each arm.

use crate::error::ModelError;
use crate::models::gbm::GbmParams;
use crate::models::heston::HestonParams;
use crate::models::hull_white::HullWhiteParams;
use crate::models::vasicek::VasicekParams;

/// State of a model between steps.
///
/// Level-only models carry a single value; Heston additionally carries the
/// instantaneous variance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelState {
    /// Single observable level (spot or short rate).
    Single(f64),
    /// Level plus instantaneous variance.
    TwoFactor {
        /// Observable level.
        level: f64,
        /// Instantaneous variance, kept non-negative by the kernel.
        variance: f64,
    },
}

impl ModelState {
    /// The observable level recorded on paths.
    #[inline]
    pub fn level(&self) -> f64 {
        match self {
            ModelState::Single(level) => *level,
            ModelState::TwoFactor { level, .. } => *level,
        }
    }

    /// The instantaneous variance, if the model carries one.
    #[inline]
    pub fn variance(&self) -> Option<f64> {
        match self {
            ModelState::Single(_) => None,
            ModelState::TwoFactor { variance, .. } => Some(*variance),
        }
    }
}

/// Parameters of one risk factor's stochastic model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelParameters {
    /// Geometric Brownian motion.
    Gbm(GbmParams),
    /// Vasicek short rate.
    Vasicek(VasicekParams),
    /// Hull-White short rate.
    HullWhite(HullWhiteParams),
    /// Heston stochastic volatility.
    Heston(HestonParams),
}

impl ModelParameters {
    /// Human-readable model name, used in logs.
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelParameters::Gbm(_) => "GBM",
            ModelParameters::Vasicek(_) => "Vasicek",
            ModelParameters::HullWhite(_) => "Hull-White",
            ModelParameters::Heston(_) => "Heston",
        }
    }

    /// Number of independent standard normals one step consumes.
    #[inline]
    pub fn brownian_dim(&self) -> usize {
        match self {
            ModelParameters::Heston(_) => 2,
            _ => 1,
        }
    }

    /// Re-checks parameter constraints; the simulator calls this before
    /// any path work starts.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelParameters::Gbm(p) => p.validate(),
            ModelParameters::Vasicek(p) => p.validate(),
            ModelParameters::HullWhite(p) => p.validate(),
            ModelParameters::Heston(p) => p.validate(),
        }
    }

    /// State at `t = 0`.
    #[inline]
    pub fn initial_state(&self) -> ModelState {
        match self {
            ModelParameters::Gbm(p) => ModelState::Single(p.spot),
            ModelParameters::Vasicek(p) => ModelState::Single(p.initial_rate),
            ModelParameters::HullWhite(p) => ModelState::Single(p.initial_rate),
            ModelParameters::Heston(p) => ModelState::TwoFactor {
                level: p.spot,
                variance: p.initial_var,
            },
        }
    }

    /// Advances the state by `dt` given `brownian_dim()` standard normal
    /// draws in `dw`.
    ///
    /// # Panics
    /// Debug-asserts that `dw` supplies exactly `brownian_dim()` values;
    /// the simulator owns the draw buffer and upholds this.
    #[inline]
    pub fn evolve_step(&self, state: ModelState, dt: f64, dw: &[f64]) -> ModelState {
        debug_assert_eq!(dw.len(), self.brownian_dim());
        match (self, state) {
            (ModelParameters::Gbm(p), ModelState::Single(level)) => {
                ModelState::Single(p.step(level, dt, dw[0]))
            }
            (ModelParameters::Vasicek(p), ModelState::Single(rate)) => {
                ModelState::Single(p.step(rate, dt, dw[0]))
            }
            (ModelParameters::HullWhite(p), ModelState::Single(rate)) => {
                ModelState::Single(p.step(rate, dt, dw[0]))
            }
            (ModelParameters::Heston(p), ModelState::TwoFactor { level, variance }) => {
                let (next_level, next_var) = p.step(level, variance, dt, dw[0], dw[1]);
                ModelState::TwoFactor {
                    level: next_level,
                    variance: next_var,
                }
            }
            // State shape is fixed by initial_state(); a mismatch means the
            // caller mixed states between models.
            _ => unreachable!("model state shape mismatch"),
        }
    }
}
