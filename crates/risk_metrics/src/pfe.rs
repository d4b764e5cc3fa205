//! Potential Future Exposure.
//!
//! PFE at confidence `c` and horizon `t` is the `c`-quantile of the
//! exposure distribution at `t`. The Monte Carlo path reads distributions
//! out of an [`ExposureReport`]; the analytic path prices the closed-form
//! GBM factor quantile through the revaluation bridge, which is exact for
//! portfolios whose value is monotonic in that single factor.

use risk_core::math::{norm_ppf, weighted_quantile};
use risk_core::{NettingSetId, TimeGrid};
use risk_models::GbmParams;
use risk_simulation::SimulationError;
use tracing::debug;

use crate::aggregate::{revalue_scenario, ExposureDistribution, ExposureReport};
use crate::error::{MetricError, ScenarioError};
use crate::market::MarketSnapshot;
use crate::portfolio::Portfolio;
use crate::result::{PfeMethod, PfePoint, PfeProfileResult};
use crate::reval::RevaluationBridge;
use crate::scenarios::Scenario;
use crate::var::{check_confidence, check_tail_mass};

/// How netting-set distributions combine into a portfolio figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollupPolicy {
    /// Quantile of the joint portfolio distribution. The default for
    /// Monte Carlo runs, whose scenarios already carry cross-netting-set
    /// dependence.
    #[default]
    JointDistribution,
    /// Sum of per-netting-set quantiles: conservative, ignores
    /// diversification across netting sets.
    SumNettingSets,
}

/// Direction of the portfolio value in the driving factor, for the
/// analytic profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileDirection {
    /// Portfolio value rises with the factor level; the adverse quantile
    /// is the upper one.
    Increasing,
    /// Portfolio value falls with the factor level; the adverse quantile
    /// is the lower one.
    Decreasing,
}

/// Exposure quantile of one distribution.
///
/// # Errors
/// - [`MetricError::InvalidConfidence`]
/// - [`MetricError::EmptyDistribution`]
/// - [`MetricError::InsufficientSample`] when `n * (1 - c) < 1`
pub fn scenario_pfe(
    distribution: &ExposureDistribution,
    confidence: f64,
) -> Result<f64, MetricError> {
    check_confidence(confidence)?;
    if distribution.is_empty() {
        return Err(MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        });
    }
    check_tail_mass(distribution.len(), confidence)?;
    weighted_quantile(&distribution.exposures(), &distribution.weights(), confidence).ok_or(
        MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        },
    )
}

/// Time-indexed slots of a report, with their grid times.
fn profile_slots(
    report: &ExposureReport,
    grid: &TimeGrid,
) -> Result<Vec<(usize, f64)>, MetricError> {
    let indices: Vec<usize> = report
        .time_slots()
        .into_iter()
        .flatten()
        .collect();
    if indices.is_empty() {
        return Err(MetricError::EmptyDistribution {
            netting_set: None,
            time_index: None,
        });
    }
    indices
        .into_iter()
        .map(|index| {
            let time = grid.get(index).ok_or(MetricError::Scenario(
                ScenarioError::TimeIndexOutOfRange {
                    index,
                    grid_len: grid.len(),
                },
            ))?;
            Ok((index, time))
        })
        .collect()
}

/// Portfolio PFE profile from an aggregated report.
///
/// One point per time-indexed slot of the report, at the grid's times.
///
/// # Errors
/// - [`MetricError::EmptyDistribution`] when the report has no
///   time-indexed slots (or a netting set is missing a slot under
///   [`RollupPolicy::SumNettingSets`])
/// - errors of [`scenario_pfe`] per slot
/// - [`MetricError::NonMonotonicProfile`] from profile assembly
pub fn pfe_profile(
    report: &ExposureReport,
    grid: &TimeGrid,
    confidence: f64,
    policy: RollupPolicy,
) -> Result<PfeProfileResult, MetricError> {
    let slots = profile_slots(report, grid)?;
    debug!(points = slots.len(), confidence, ?policy, "assembling PFE profile");

    let mut points = Vec::with_capacity(slots.len());
    for (index, time) in slots {
        let exposure = match policy {
            RollupPolicy::JointDistribution => {
                let dist = report.portfolio(Some(index)).ok_or(
                    MetricError::EmptyDistribution {
                        netting_set: None,
                        time_index: Some(index),
                    },
                )?;
                scenario_pfe(dist, confidence)?
            }
            RollupPolicy::SumNettingSets => {
                let mut total = 0.0;
                for id in report.netting_set_ids() {
                    let dist = report.netting_set(&id, Some(index)).ok_or(
                        MetricError::EmptyDistribution {
                            netting_set: Some(id.clone()),
                            time_index: Some(index),
                        },
                    )?;
                    total += scenario_pfe(dist, confidence)?;
                }
                total
            }
        };
        points.push(PfePoint { time, exposure });
    }
    PfeProfileResult::new(points, confidence, PfeMethod::MonteCarlo)
}

/// PFE profile of a single netting set.
///
/// # Errors
/// As [`pfe_profile`].
pub fn netting_set_pfe_profile(
    report: &ExposureReport,
    netting_set: &NettingSetId,
    grid: &TimeGrid,
    confidence: f64,
) -> Result<PfeProfileResult, MetricError> {
    let slots = profile_slots(report, grid)?;
    let mut points = Vec::with_capacity(slots.len());
    for (index, time) in slots {
        let dist = report.netting_set(netting_set, Some(index)).ok_or(
            MetricError::EmptyDistribution {
                netting_set: Some(netting_set.clone()),
                time_index: Some(index),
            },
        )?;
        points.push(PfePoint {
            time,
            exposure: scenario_pfe(dist, confidence)?,
        });
    }
    PfeProfileResult::new(points, confidence, PfeMethod::MonteCarlo)
}

/// Expected (weighted mean) exposure per time-indexed slot.
///
/// # Errors
/// [`MetricError::EmptyDistribution`] when the report has no time-indexed
/// slots or a slot's portfolio distribution is missing.
pub fn expected_exposure_profile(
    report: &ExposureReport,
    grid: &TimeGrid,
) -> Result<Vec<PfePoint>, MetricError> {
    let slots = profile_slots(report, grid)?;
    let mut points = Vec::with_capacity(slots.len());
    for (index, time) in slots {
        let dist = report
            .portfolio(Some(index))
            .ok_or(MetricError::EmptyDistribution {
                netting_set: None,
                time_index: Some(index),
            })?;
        let total_weight: f64 = dist.weights().iter().sum();
        let exposure = dist
            .samples()
            .iter()
            .map(|s| s.weight * s.exposure)
            .sum::<f64>()
            / total_weight;
        points.push(PfePoint { time, exposure });
    }
    Ok(points)
}

/// Analytic PFE profile for a portfolio driven by a single GBM factor.
///
/// For each grid time the adverse factor quantile
/// `S_q(t) = S exp((mu - sigma^2/2) t + sigma sqrt(t) z)` is priced
/// through the bridge and pushed through the netting rules; exact when
/// the portfolio value is monotonic in the factor, with the direction
/// supplied by the caller.
///
/// # Errors
/// - [`MetricError::InvalidConfidence`]
/// - [`MetricError::Simulation`] for invalid GBM parameters
/// - [`MetricError::Revaluation`] on bridge failure (the scenario index
///   is the grid position)
/// - [`MetricError::NonMonotonicProfile`] from profile assembly
#[allow(clippy::too_many_arguments)]
pub fn analytic_pfe_profile(
    portfolio: &Portfolio,
    factor: &risk_core::RiskFactorId,
    params: &GbmParams,
    direction: ProfileDirection,
    grid: &TimeGrid,
    confidence: f64,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
) -> Result<PfeProfileResult, MetricError> {
    check_confidence(confidence)?;
    params
        .validate()
        .map_err(|err| MetricError::Simulation(SimulationError::from(err)))?;

    let p = match direction {
        ProfileDirection::Increasing => confidence,
        ProfileDirection::Decreasing => 1.0 - confidence,
    };
    let z = norm_ppf(p);
    let netting_set_ids = portfolio.netting_set_ids();

    let mut points = Vec::with_capacity(grid.len());
    for (index, &t) in grid.times().iter().enumerate() {
        let level = params.spot
            * ((params.drift - 0.5 * params.volatility * params.volatility) * t
                + params.volatility * t.sqrt() * z)
                .exp();
        let mut levels = std::collections::BTreeMap::new();
        levels.insert(factor.clone(), level);
        let scenario = Scenario::new(levels, 1.0);
        let outcome = revalue_scenario(
            portfolio,
            &netting_set_ids,
            &scenario,
            index,
            bridge,
            market,
        )?;
        points.push(PfePoint {
            time: t,
            exposure: outcome.portfolio_exposure,
        });
    }
    PfeProfileResult::new(points, confidence, PfeMethod::Analytic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, ExposureSample};
    use crate::market::InMemorySnapshot;
    use crate::portfolio::{NettingRule, Position};
    use crate::reval::RevaluationError;
    use crate::scenarios::ScenarioSet;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use risk_core::RiskFactorId;
    use risk_models::ModelParameters;
    use risk_simulation::simulate;
    use std::collections::BTreeMap;

    /// Prices every position as `quantity * level("A")`.
    struct LinearBridge;

    impl RevaluationBridge for LinearBridge {
        fn value(
            &self,
            position: &Position,
            scenario: &Scenario,
            _market: &dyn MarketSnapshot,
        ) -> Result<f64, RevaluationError> {
            scenario
                .level(&RiskFactorId::new("A"))
                .map(|level| position.quantity * level)
                .ok_or_else(|| RevaluationError::new("missing factor A"))
        }
    }

    /// Short forward: `quantity * (100 - level("A"))`.
    struct ShortForwardBridge;

    impl RevaluationBridge for ShortForwardBridge {
        fn value(
            &self,
            position: &Position,
            scenario: &Scenario,
            _market: &dyn MarketSnapshot,
        ) -> Result<f64, RevaluationError> {
            scenario
                .level(&RiskFactorId::new("A"))
                .map(|level| position.quantity * (100.0 - level))
                .ok_or_else(|| RevaluationError::new("missing factor A"))
        }
    }

    fn snapshot() -> InMemorySnapshot {
        InMemorySnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()).with_level("A", 100.0)
    }

    fn long_portfolio() -> Portfolio {
        Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .position(Position::new("P1", "I1", 1.0, "NS1"))
            .build()
            .unwrap()
    }

    fn monte_carlo_report(
        num_paths: usize,
        seed: u64,
    ) -> (ExposureReport, TimeGrid) {
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        let model = ModelParameters::Gbm(GbmParams::new(100.0, 0.0, 0.2).unwrap());
        let mut sets = BTreeMap::new();
        sets.insert(
            RiskFactorId::new("A"),
            simulate(&model, &grid, num_paths, seed).unwrap(),
        );
        let indices: Vec<usize> = (0..grid.len()).collect();
        let scenarios = ScenarioSet::from_path_sets(&sets, &indices).unwrap();
        let report = aggregate(&long_portfolio(), &scenarios, &LinearBridge, &snapshot()).unwrap();
        (report, grid)
    }

    #[test]
    fn test_scenario_pfe_quantile() {
        let samples: Vec<ExposureSample> = (1..=100)
            .map(|i| ExposureSample {
                weight: 0.01,
                net_value: i as f64,
                exposure: i as f64,
            })
            .collect();
        let dist = ExposureDistribution::from_samples(samples);
        let pfe = scenario_pfe(&dist, 0.95).unwrap();
        // Midpoint positions put the 95% point at 95.5.
        assert_relative_eq!(pfe, 95.5, epsilon = 1e-10);
    }

    #[test]
    fn test_scenario_pfe_sample_gate() {
        let dist = ExposureDistribution::from_samples(vec![
            ExposureSample {
                weight: 0.5,
                net_value: 1.0,
                exposure: 1.0,
            },
            ExposureSample {
                weight: 0.5,
                net_value: 2.0,
                exposure: 2.0,
            },
        ]);
        assert!(matches!(
            scenario_pfe(&dist, 0.95),
            Err(MetricError::InsufficientSample { .. })
        ));
    }

    #[test]
    fn test_pfe_profile_shape_and_bounds() {
        let (report, grid) = monte_carlo_report(2000, 42);
        let profile = pfe_profile(&report, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        assert_eq!(profile.points().len(), 4);
        let times: Vec<f64> = profile.points().iter().map(|p| p.time).collect();
        assert_eq!(times, grid.times());
        for point in profile.points() {
            assert!(point.exposure >= 0.0);
        }
        // A long GBM exposure fans out with time.
        assert!(profile.points()[3].exposure > profile.points()[0].exposure);
    }

    #[test]
    fn test_pfe_profile_bit_for_bit_reproducible() {
        let (report_a, grid) = monte_carlo_report(2000, 42);
        let (report_b, _) = monte_carlo_report(2000, 42);
        let a = pfe_profile(&report_a, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        let b = pfe_profile(&report_b, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rollup_policies_agree_for_single_netting_set() {
        let (report, grid) = monte_carlo_report(2000, 7);
        let joint = pfe_profile(&report, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        let summed = pfe_profile(&report, &grid, 0.95, RollupPolicy::SumNettingSets).unwrap();
        for (a, b) in joint.points().iter().zip(summed.points()) {
            assert_relative_eq!(a.exposure, b.exposure, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_netting_set_profile_matches_portfolio_for_single_set() {
        let (report, grid) = monte_carlo_report(1000, 3);
        let portfolio_profile =
            pfe_profile(&report, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        let set_profile =
            netting_set_pfe_profile(&report, &NettingSetId::new("NS1"), &grid, 0.95).unwrap();
        for (a, b) in portfolio_profile.points().iter().zip(set_profile.points()) {
            assert_relative_eq!(a.exposure, b.exposure, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_expected_exposure_below_pfe() {
        let (report, grid) = monte_carlo_report(2000, 11);
        let pfe = pfe_profile(&report, &grid, 0.95, RollupPolicy::JointDistribution).unwrap();
        let ee = expected_exposure_profile(&report, &grid).unwrap();
        for (pfe_point, ee_point) in pfe.points().iter().zip(&ee) {
            assert!(ee_point.exposure <= pfe_point.exposure);
        }
    }

    #[test]
    fn test_analytic_profile_matches_closed_form() {
        let params = GbmParams::new(100.0, 0.0, 0.2).unwrap();
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        let profile = analytic_pfe_profile(
            &long_portfolio(),
            &RiskFactorId::new("A"),
            &params,
            ProfileDirection::Increasing,
            &grid,
            0.95,
            &LinearBridge,
            &snapshot(),
        )
        .unwrap();
        assert_eq!(profile.method, PfeMethod::Analytic);
        let z = norm_ppf(0.95);
        for point in profile.points() {
            let t = point.time;
            let expected = 100.0 * ((-0.02 * t) + 0.2 * t.sqrt() * z).exp();
            assert_relative_eq!(point.exposure, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_analytic_profile_decreasing_direction() {
        // Short forward: adverse moves are downward factor levels.
        let params = GbmParams::new(100.0, 0.0, 0.2).unwrap();
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        let profile = analytic_pfe_profile(
            &long_portfolio(),
            &RiskFactorId::new("A"),
            &params,
            ProfileDirection::Decreasing,
            &grid,
            0.95,
            &ShortForwardBridge,
            &snapshot(),
        )
        .unwrap();
        let z = norm_ppf(0.05);
        for point in profile.points() {
            let t = point.time;
            let adverse_level = 100.0 * ((-0.02 * t) + 0.2 * t.sqrt() * z).exp();
            let expected = (100.0 - adverse_level).max(0.0);
            assert_relative_eq!(point.exposure, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_profile_requires_time_indexed_slots() {
        use crate::scenarios::{Scenario, ScenarioMethod};
        let mut levels = BTreeMap::new();
        levels.insert(RiskFactorId::new("A"), 100.0);
        let set = ScenarioSet::from_parts(
            ScenarioMethod::Stress,
            vec![Scenario::new(levels, 1.0)],
        );
        let report = aggregate(&long_portfolio(), &set, &LinearBridge, &snapshot()).unwrap();
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        assert!(matches!(
            pfe_profile(&report, &grid, 0.95, RollupPolicy::JointDistribution),
            Err(MetricError::EmptyDistribution { .. })
        ));
    }
}
