//! Value-at-Risk.
//!
//! Sign convention: returns are gains (a -2% loss is `-0.02`) and VaR is
//! reported as a positive loss amount. Horizon scaling uses the
//! square-root-of-time rule for the volatility term; this and the
//! normality assumption of the parametric estimator are documented
//! caveats, not configurable behaviour.

use risk_core::math::{norm_ppf, quantile, weighted_quantile};
use risk_core::math::{mean, sample_std};

use crate::aggregate::ExposureDistribution;
use crate::error::MetricError;
use crate::result::{VarMethod, VarResult};

pub(crate) fn check_confidence(confidence: f64) -> Result<(), MetricError> {
    if !confidence.is_finite() || confidence <= 0.0 || confidence >= 1.0 {
        return Err(MetricError::InvalidConfidence(confidence));
    }
    Ok(())
}

fn check_horizon(horizon: f64) -> Result<(), MetricError> {
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(MetricError::InvalidHorizon(horizon));
    }
    Ok(())
}

/// A quantile at confidence `c` needs at least one sample of effective
/// tail mass: `n * (1 - c) >= 1`.
pub(crate) fn check_tail_mass(n: usize, confidence: f64) -> Result<(), MetricError> {
    if (n as f64) * (1.0 - confidence) < 1.0 {
        return Err(MetricError::InsufficientSample {
            confidence,
            actual: n,
        });
    }
    Ok(())
}

/// Historical VaR: the empirical return quantile, scaled to the horizon.
///
/// `VaR(c) = -quantile(returns, 1 - c) * sqrt(horizon)` with linear
/// interpolation between order statistics. `horizon` is in return
/// periods (1 = the sampling frequency of `returns`).
///
/// # Errors
/// - [`MetricError::InvalidConfidence`] / [`MetricError::InvalidHorizon`]
/// - [`MetricError::InsufficientSample`] when `n * (1 - c) < 1`
pub fn historical_var(
    returns: &[f64],
    confidence: f64,
    horizon: f64,
) -> Result<VarResult, MetricError> {
    check_confidence(confidence)?;
    check_horizon(horizon)?;
    check_tail_mass(returns.len(), confidence)?;

    let tail = quantile(returns, 1.0 - confidence).ok_or(MetricError::EmptyDistribution {
        netting_set: None,
        time_index: None,
    })?;
    Ok(VarResult::new(
        -tail * horizon.sqrt(),
        confidence,
        horizon,
        VarMethod::Historical,
    ))
}

/// Parametric (variance-covariance) VaR from a return series.
///
/// Sample moments feed [`parametric_var_from_moments`]; the standard
/// deviation uses one delta degree of freedom.
///
/// # Errors
/// As [`parametric_var_from_moments`], plus
/// [`MetricError::EmptyDistribution`] for an empty series.
pub fn parametric_var(
    returns: &[f64],
    confidence: f64,
    horizon: f64,
) -> Result<VarResult, MetricError> {
    if returns.is_empty() {
        return Err(MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        });
    }
    parametric_var_from_moments(mean(returns), sample_std(returns), confidence, horizon)
}

/// Parametric VaR from explicit per-period return moments.
///
/// `VaR(c) = z_c * sigma * sqrt(horizon) - mu * horizon`, assuming
/// normally distributed returns. The drift term reduces the reported loss
/// for positive expected returns.
///
/// # Errors
/// [`MetricError::InvalidConfidence`] / [`MetricError::InvalidHorizon`].
pub fn parametric_var_from_moments(
    mu: f64,
    sigma: f64,
    confidence: f64,
    horizon: f64,
) -> Result<VarResult, MetricError> {
    check_confidence(confidence)?;
    check_horizon(horizon)?;

    let z = norm_ppf(confidence);
    Ok(VarResult::new(
        z * sigma * horizon.sqrt() - mu * horizon,
        confidence,
        horizon,
        VarMethod::Parametric,
    ))
}

/// Monte Carlo VaR from a simulated exposure distribution.
///
/// The P&L of each scenario is `net_value - base_value`; VaR is the
/// negated weighted quantile of that P&L at `1 - c`. No horizon scaling
/// is applied — the simulation already runs to the horizon — so
/// `horizon` is carried as metadata only.
///
/// # Errors
/// - [`MetricError::InvalidConfidence`] / [`MetricError::InvalidHorizon`]
/// - [`MetricError::EmptyDistribution`] for an empty distribution
/// - [`MetricError::InsufficientSample`] when `n * (1 - c) < 1`
pub fn monte_carlo_var_from_distribution(
    distribution: &ExposureDistribution,
    base_value: f64,
    confidence: f64,
    horizon: f64,
) -> Result<VarResult, MetricError> {
    check_confidence(confidence)?;
    check_horizon(horizon)?;
    if distribution.is_empty() {
        return Err(MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        });
    }
    check_tail_mass(distribution.len(), confidence)?;

    let pnl: Vec<f64> = distribution
        .net_values()
        .iter()
        .map(|net| net - base_value)
        .collect();
    let weights = distribution.weights();
    let tail = weighted_quantile(&pnl, &weights, 1.0 - confidence).ok_or(
        MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        },
    )?;
    Ok(VarResult::new(
        -tail,
        confidence,
        horizon,
        VarMethod::MonteCarlo,
    ))
}
