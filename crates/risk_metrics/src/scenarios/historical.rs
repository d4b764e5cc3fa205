//! Historical scenario construction.
//!
//! Resamples observed return periods onto current levels. Cross-sectional
//! dependence is preserved by construction: period `k` of every factor
//! lands in the same scenario, so whatever co-movement the history
//! exhibits carries over without any correlation model.

use std::collections::BTreeMap;

use risk_core::RiskFactorId;

use crate::error::ScenarioError;
use crate::scenarios::{Scenario, ScenarioMethod, ScenarioSet};

/// Default minimum number of return periods.
pub const DEFAULT_MIN_PERIODS: usize = 20;

/// Return convention for historical resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReturnKind {
    /// `s[k+1] / s[k] - 1`, applied as `level * (1 + r)`.
    #[default]
    Simple,
    /// `ln(s[k+1] / s[k])`, applied as `level * exp(r)`.
    Log,
}

/// Options for historical scenario construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoricalOptions {
    /// Return convention.
    pub return_kind: ReturnKind,
    /// Minimum number of return periods; fewer fails with
    /// [`ScenarioError::InsufficientData`].
    pub min_periods: usize,
    /// Per-period weights, oldest first. `None` weights periods equally;
    /// an explicit vector is normalised to sum to one.
    pub weights: Option<Vec<f64>>,
}

impl Default for HistoricalOptions {
    fn default() -> Self {
        Self {
            return_kind: ReturnKind::Simple,
            min_periods: DEFAULT_MIN_PERIODS,
            weights: None,
        }
    }
}

/// Builds a historical scenario set.
///
/// `observed` holds one aligned series per factor, oldest first; all
/// series must cover the same observation dates. Each of the `n - 1`
/// return periods produces one scenario by applying that period's returns
/// of every factor to the corresponding entry of `current_levels`.
///
/// # Errors
/// - [`ScenarioError::EmptyInput`] without factors
/// - [`ScenarioError::UnknownFactor`] when `current_levels` and `observed`
///   disagree on the factor set
/// - [`ScenarioError::SeriesLengthMismatch`] for unaligned series
/// - [`ScenarioError::InsufficientData`] below `min_periods`
/// - [`ScenarioError::NonPositiveObservation`] for log returns over
///   non-positive observations
/// - [`ScenarioError::InvalidWeights`] for unusable explicit weights
pub fn historical_scenarios(
    current_levels: &BTreeMap<RiskFactorId, f64>,
    observed: &BTreeMap<RiskFactorId, Vec<f64>>,
    options: &HistoricalOptions,
) -> Result<ScenarioSet, ScenarioError> {
    if current_levels.is_empty() {
        return Err(ScenarioError::EmptyInput("risk factor"));
    }
    for factor in current_levels.keys() {
        if !observed.contains_key(factor) {
            return Err(ScenarioError::UnknownFactor(factor.clone()));
        }
    }
    for factor in observed.keys() {
        if !current_levels.contains_key(factor) {
            return Err(ScenarioError::UnknownFactor(factor.clone()));
        }
    }

    let expected = observed
        .values()
        .next()
        .map(Vec::len)
        .unwrap_or(0);
    for (factor, series) in observed {
        if series.len() != expected {
            return Err(ScenarioError::SeriesLengthMismatch {
                factor: factor.clone(),
                expected,
                got: series.len(),
            });
        }
    }

    let periods = expected.saturating_sub(1);
    if periods < options.min_periods {
        return Err(ScenarioError::InsufficientData {
            required: options.min_periods,
            actual: periods,
        });
    }

    let weights = resolve_weights(options.weights.as_deref(), periods)?;

    // Per-factor return series, period-major.
    let mut returns: BTreeMap<&RiskFactorId, Vec<f64>> = BTreeMap::new();
    for (factor, series) in observed {
        let mut factor_returns = Vec::with_capacity(periods);
        for k in 0..periods {
            let (prev, next) = (series[k], series[k + 1]);
            let r = match options.return_kind {
                ReturnKind::Simple => {
                    if prev == 0.0 {
                        return Err(ScenarioError::NonPositiveObservation {
                            factor: factor.clone(),
                            index: k,
                        });
                    }
                    next / prev - 1.0
                }
                ReturnKind::Log => {
                    if prev <= 0.0 || next <= 0.0 {
                        return Err(ScenarioError::NonPositiveObservation {
                            factor: factor.clone(),
                            index: if prev <= 0.0 { k } else { k + 1 },
                        });
                    }
                    (next / prev).ln()
                }
            };
            factor_returns.push(r);
        }
        returns.insert(factor, factor_returns);
    }

    let scenarios: Vec<Scenario> = (0..periods)
        .map(|k| {
            let levels: BTreeMap<RiskFactorId, f64> = current_levels
                .iter()
                .map(|(factor, &level)| {
                    let r = returns[factor][k];
                    let shifted = match options.return_kind {
                        ReturnKind::Simple => level * (1.0 + r),
                        ReturnKind::Log => level * r.exp(),
                    };
                    (factor.clone(), shifted)
                })
                .collect();
            Scenario::new(levels, weights[k])
        })
        .collect();

    Ok(ScenarioSet::from_parts(ScenarioMethod::Historical, scenarios))
}

/// Equal weights, or a normalised copy of the explicit vector.
fn resolve_weights(explicit: Option<&[f64]>, periods: usize) -> Result<Vec<f64>, ScenarioError> {
    match explicit {
        None => Ok(vec![1.0 / periods as f64; periods]),
        Some(weights) => {
            if weights.len() != periods {
                return Err(ScenarioError::InvalidWeights {
                    reason: "weight count does not match return periods",
                });
            }
            if weights.iter().any(|&w| !w.is_finite() || w < 0.0) {
                return Err(ScenarioError::InvalidWeights {
                    reason: "weights must be finite and non-negative",
                });
            }
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                return Err(ScenarioError::InvalidWeights {
                    reason: "weights must not sum to zero",
                });
            }
            Ok(weights.iter().map(|w| w / total).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn factor(name: &str) -> RiskFactorId {
        RiskFactorId::new(name)
    }

    fn inputs() -> (BTreeMap<RiskFactorId, f64>, BTreeMap<RiskFactorId, Vec<f64>>) {
        let mut current = BTreeMap::new();
        current.insert(factor("A"), 100.0);
        current.insert(factor("B"), 1.10);
        let mut observed = BTreeMap::new();
        observed.insert(factor("A"), vec![90.0, 99.0, 89.1, 93.555]);
        observed.insert(factor("B"), vec![1.00, 1.02, 1.01, 1.04]);
        (current, observed)
    }

    fn options(min_periods: usize) -> HistoricalOptions {
        HistoricalOptions {
            min_periods,
            ..HistoricalOptions::default()
        }
    }

    #[test]
    fn test_simple_returns_applied_to_current_levels() {
        let (current, observed) = inputs();
        let set = historical_scenarios(&current, &observed, &options(1)).unwrap();
        assert_eq!(set.method(), ScenarioMethod::Historical);
        assert_eq!(set.len(), 3);

        // First period: A returns +10%, B returns +2%.
        let first = &set.scenarios()[0];
        assert_relative_eq!(first.level(&factor("A")).unwrap(), 110.0, epsilon = 1e-12);
        assert_relative_eq!(first.level(&factor("B")).unwrap(), 1.10 * 1.02, epsilon = 1e-12);
        assert_relative_eq!(first.weight(), 1.0 / 3.0, epsilon = 1e-15);
        set.validate_weights().unwrap();
    }

    #[test]
    fn test_log_returns() {
        let (current, observed) = inputs();
        let opts = HistoricalOptions {
            return_kind: ReturnKind::Log,
            min_periods: 1,
            weights: None,
        };
        let set = historical_scenarios(&current, &observed, &opts).unwrap();
        // exp(ln(99/90)) = 1.1 exactly, so the first scenario matches the
        // simple-return one here.
        let first = &set.scenarios()[0];
        assert_relative_eq!(first.level(&factor("A")).unwrap(), 110.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_sectional_dependence_preserved() {
        // Every scenario takes all factors from the same period.
        let (current, observed) = inputs();
        let set = historical_scenarios(&current, &observed, &options(1)).unwrap();
        let second = &set.scenarios()[1];
        assert_relative_eq!(
            second.level(&factor("A")).unwrap(),
            100.0 * (89.1 / 99.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            second.level(&factor("B")).unwrap(),
            1.10 * (1.01 / 1.02),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_insufficient_data_gate() {
        let (current, observed) = inputs();
        let err = historical_scenarios(&current, &observed, &options(10)).unwrap_err();
        assert_eq!(
            err,
            ScenarioError::InsufficientData {
                required: 10,
                actual: 3
            }
        );
    }

    #[test]
    fn test_factor_set_mismatch() {
        let (current, mut observed) = inputs();
        observed.remove(&factor("B"));
        assert!(matches!(
            historical_scenarios(&current, &observed, &options(1)),
            Err(ScenarioError::UnknownFactor(_))
        ));
    }

    #[test]
    fn test_series_alignment_enforced() {
        let (current, mut observed) = inputs();
        observed.get_mut(&factor("B")).unwrap().pop();
        assert!(matches!(
            historical_scenarios(&current, &observed, &options(1)),
            Err(ScenarioError::SeriesLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_log_returns_reject_non_positive_observations() {
        let (current, mut observed) = inputs();
        observed.get_mut(&factor("A")).unwrap()[1] = -5.0;
        let opts = HistoricalOptions {
            return_kind: ReturnKind::Log,
            min_periods: 1,
            weights: None,
        };
        assert!(matches!(
            historical_scenarios(&current, &observed, &opts),
            Err(ScenarioError::NonPositiveObservation { .. })
        ));
    }

    #[test]
    fn test_explicit_weights_normalised() {
        let (current, observed) = inputs();
        let opts = HistoricalOptions {
            return_kind: ReturnKind::Simple,
            min_periods: 1,
            weights: Some(vec![1.0, 2.0, 1.0]),
        };
        let set = historical_scenarios(&current, &observed, &opts).unwrap();
        let weights: Vec<f64> = set.scenarios().iter().map(Scenario::weight).collect();
        assert_relative_eq!(weights[0], 0.25, epsilon = 1e-15);
        assert_relative_eq!(weights[1], 0.5, epsilon = 1e-15);
        set.validate_weights().unwrap();
    }

    #[test]
    fn test_explicit_weights_validated() {
        let (current, observed) = inputs();
        for weights in [vec![1.0, 2.0], vec![-1.0, 1.0, 1.0], vec![0.0, 0.0, 0.0]] {
            let opts = HistoricalOptions {
                return_kind: ReturnKind::Simple,
                min_periods: 1,
                weights: Some(weights),
            };
            assert!(matches!(
                historical_scenarios(&current, &observed, &opts),
                Err(ScenarioError::InvalidWeights { .. })
            ));
        }
    }
}
