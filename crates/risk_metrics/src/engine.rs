//! High-level Monte Carlo drivers.
//!
//! Wires the full pipeline: joint path sampling, scenario construction,
//! exposure aggregation and the final metric. Callers supply the
//! portfolio, the factor models, the pricing bridge and the market
//! snapshot; the drivers own determinism (fixed seed in the config) and
//! stamp the snapshot's valuation date on the results.

use std::collections::BTreeMap;

use risk_core::{CancellationToken, RiskFactorId, TimeGrid};
use risk_models::{FactorCorrelation, ModelParameters};
use risk_simulation::{sample_joint_with, SimulationError, DEFAULT_PSD_TOLERANCE};
use tracing::info;

use crate::aggregate::aggregate_with;
use crate::error::MetricError;
use crate::market::MarketSnapshot;
use crate::pfe::{pfe_profile, RollupPolicy};
use crate::portfolio::Portfolio;
use crate::result::{PfeProfileResult, VarResult};
use crate::reval::RevaluationBridge;
use crate::scenarios::{Scenario, ScenarioSet};
use crate::var::{check_confidence, monte_carlo_var_from_distribution};

/// Hard ceiling on the path count accepted by the drivers.
pub const MAX_PATHS: usize = 10_000_000;

/// Configuration of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskRunConfig {
    /// Number of simulated paths.
    pub num_paths: usize,
    /// Base RNG seed; runs with equal configs are bit-identical.
    pub seed: u64,
    /// Confidence level in (0, 1).
    pub confidence: f64,
    /// Tolerance for nearest-PSD correlation repair.
    pub psd_tolerance: f64,
    /// Portfolio roll-up policy for PFE profiles.
    pub rollup: RollupPolicy,
}

impl Default for RiskRunConfig {
    fn default() -> Self {
        Self {
            num_paths: 10_000,
            seed: 42,
            confidence: 0.95,
            psd_tolerance: DEFAULT_PSD_TOLERANCE,
            rollup: RollupPolicy::JointDistribution,
        }
    }
}

impl RiskRunConfig {
    /// Sets the path count.
    pub fn with_num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = num_paths;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the confidence level.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the PSD-repair tolerance.
    pub fn with_psd_tolerance(mut self, psd_tolerance: f64) -> Self {
        self.psd_tolerance = psd_tolerance;
        self
    }

    /// Sets the roll-up policy.
    pub fn with_rollup(mut self, rollup: RollupPolicy) -> Self {
        self.rollup = rollup;
        self
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    /// - [`MetricError::Simulation`] for a path count outside
    ///   `1..=MAX_PATHS`
    /// - [`MetricError::InvalidConfidence`]
    pub fn validate(&self) -> Result<(), MetricError> {
        if self.num_paths == 0 || self.num_paths > MAX_PATHS {
            return Err(MetricError::Simulation(SimulationError::InvalidPathCount(
                self.num_paths,
            )));
        }
        check_confidence(self.confidence)
    }
}

/// Lifts simulation failures, keeping cancellation as the top-level
/// variant.
fn map_simulation(err: SimulationError) -> MetricError {
    match err {
        SimulationError::Cancelled => MetricError::Cancelled,
        other => MetricError::Simulation(other),
    }
}

/// Identity correlation when the caller supplies none.
fn effective_correlation(
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: Option<&FactorCorrelation>,
) -> Result<FactorCorrelation, MetricError> {
    match correlation {
        Some(c) => Ok(c.clone()),
        None => FactorCorrelation::identity(models.keys().cloned().collect())
            .map_err(|err| MetricError::Simulation(SimulationError::from(err))),
    }
}

/// Monte Carlo PFE profile over the full grid.
///
/// Simulates all factors jointly, builds one exposure distribution per
/// grid point and reads off the exposure quantile at the configured
/// confidence. Independent factors are assumed when `correlation` is
/// `None`.
///
/// # Errors
/// Configuration, simulation, scenario and revaluation failures, each as
/// its typed [`MetricError`] variant.
pub fn monte_carlo_pfe_profile(
    portfolio: &Portfolio,
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: Option<&FactorCorrelation>,
    grid: &TimeGrid,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
    config: &RiskRunConfig,
) -> Result<PfeProfileResult, MetricError> {
    monte_carlo_pfe_profile_with(
        portfolio,
        models,
        correlation,
        grid,
        bridge,
        market,
        config,
        &CancellationToken::new(),
    )
}

/// [`monte_carlo_pfe_profile`] with cooperative cancellation.
///
/// # Errors
/// As [`monte_carlo_pfe_profile`], plus [`MetricError::Cancelled`].
#[allow(clippy::too_many_arguments)]
pub fn monte_carlo_pfe_profile_with(
    portfolio: &Portfolio,
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: Option<&FactorCorrelation>,
    grid: &TimeGrid,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
    config: &RiskRunConfig,
    cancel: &CancellationToken,
) -> Result<PfeProfileResult, MetricError> {
    config.validate()?;
    info!(
        num_paths = config.num_paths,
        seed = config.seed,
        confidence = config.confidence,
        factors = models.len(),
        steps = grid.len(),
        "monte carlo PFE run"
    );

    let correlation = effective_correlation(models, correlation)?;
    let path_sets = sample_joint_with(
        models,
        &correlation,
        grid,
        config.num_paths,
        config.seed,
        config.psd_tolerance,
        cancel,
    )
    .map_err(map_simulation)?;

    let indices: Vec<usize> = (0..grid.len()).collect();
    let scenarios = ScenarioSet::from_path_sets(&path_sets, &indices)?;
    let report = aggregate_with(portfolio, &scenarios, bridge, market, cancel)?;
    let profile = pfe_profile(&report, grid, config.confidence, config.rollup)?;
    info!(peak = profile.peak_exposure(), "monte carlo PFE run complete");
    Ok(profile.with_valuation_date(market.valuation_date()))
}

/// Monte Carlo VaR at the grid horizon.
///
/// Simulates to the final grid point only, revalues the portfolio under
/// each terminal scenario, and compares against the base value obtained by
/// revaluing under the models' initial factor levels. The reported horizon
/// is `grid.horizon()`; no additional time scaling is applied.
///
/// # Errors
/// As [`monte_carlo_pfe_profile`], plus the tail-mass gate of
/// Monte Carlo VaR.
pub fn monte_carlo_var(
    portfolio: &Portfolio,
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: Option<&FactorCorrelation>,
    grid: &TimeGrid,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
    config: &RiskRunConfig,
) -> Result<VarResult, MetricError> {
    monte_carlo_var_with(
        portfolio,
        models,
        correlation,
        grid,
        bridge,
        market,
        config,
        &CancellationToken::new(),
    )
}

/// [`monte_carlo_var`] with cooperative cancellation.
///
/// # Errors
/// As [`monte_carlo_var`], plus [`MetricError::Cancelled`].
#[allow(clippy::too_many_arguments)]
pub fn monte_carlo_var_with(
    portfolio: &Portfolio,
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: Option<&FactorCorrelation>,
    grid: &TimeGrid,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
    config: &RiskRunConfig,
    cancel: &CancellationToken,
) -> Result<VarResult, MetricError> {
    config.validate()?;
    info!(
        num_paths = config.num_paths,
        seed = config.seed,
        confidence = config.confidence,
        horizon = grid.horizon(),
        "monte carlo VaR run"
    );

    let correlation = effective_correlation(models, correlation)?;
    let path_sets = sample_joint_with(
        models,
        &correlation,
        grid,
        config.num_paths,
        config.seed,
        config.psd_tolerance,
        cancel,
    )
    .map_err(map_simulation)?;

    let terminal = grid.len() - 1;
    let scenarios = ScenarioSet::from_path_sets(&path_sets, &[terminal])?;
    let report = aggregate_with(portfolio, &scenarios, bridge, market, cancel)?;
    let distribution = report
        .portfolio(Some(terminal))
        .ok_or(MetricError::EmptyDistribution {
            netting_set: None,
            time_index: Some(terminal),
        })?;

    let base_value = base_portfolio_value(portfolio, models, bridge, market)?;
    let result = monte_carlo_var_from_distribution(
        distribution,
        base_value,
        config.confidence,
        grid.horizon(),
    )?;
    info!(var = result.value, "monte carlo VaR run complete");
    Ok(result.with_valuation_date(market.valuation_date()))
}

/// Today's portfolio value, revalued under the models' initial levels.
fn base_portfolio_value(
    portfolio: &Portfolio,
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
) -> Result<f64, MetricError> {
    let levels: BTreeMap<RiskFactorId, f64> = models
        .iter()
        .map(|(id, model)| (id.clone(), model.initial_state().level()))
        .collect();
    let base = Scenario::new(levels, 1.0);
    let netting_set_ids = portfolio.netting_set_ids();
    let outcome = crate::aggregate::revalue_scenario(
        portfolio,
        &netting_set_ids,
        &base,
        0,
        bridge,
        market,
    )?;
    Ok(outcome.portfolio_net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::InMemorySnapshot;
    use crate::portfolio::{NettingRule, Position};
    use crate::reval::{RevaluationBridge, RevaluationError};
    use crate::var::parametric_var_from_moments;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use risk_models::GbmParams;

    /// Prices every position as `quantity * level(factor named by the
    /// instrument id)`.
    struct SpotBridge;

    impl RevaluationBridge for SpotBridge {
        fn value(
            &self,
            position: &Position,
            scenario: &Scenario,
            _market: &dyn MarketSnapshot,
        ) -> Result<f64, RevaluationError> {
            let factor = RiskFactorId::new(position.instrument.as_str());
            scenario
                .level(&factor)
                .map(|level| position.quantity * level)
                .ok_or_else(|| RevaluationError::new("missing factor"))
        }
    }

    fn portfolio() -> Portfolio {
        Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .position(Position::new("P1", "EURUSD", 1_000_000.0, "NS1"))
            .build()
            .unwrap()
    }

    fn models(vol: f64) -> BTreeMap<RiskFactorId, ModelParameters> {
        let mut models = BTreeMap::new();
        models.insert(
            RiskFactorId::new("EURUSD"),
            ModelParameters::Gbm(GbmParams::new(1.10, 0.0, vol).unwrap()),
        );
        models
    }

    fn snapshot() -> InMemorySnapshot {
        InMemorySnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 28).unwrap())
            .with_level("EURUSD", 1.10)
    }

    #[test]
    fn test_config_validation() {
        assert!(RiskRunConfig::default().validate().is_ok());
        assert!(matches!(
            RiskRunConfig::default().with_num_paths(0).validate(),
            Err(MetricError::Simulation(SimulationError::InvalidPathCount(0)))
        ));
        assert!(matches!(
            RiskRunConfig::default()
                .with_num_paths(MAX_PATHS + 1)
                .validate(),
            Err(MetricError::Simulation(_))
        ));
        assert!(matches!(
            RiskRunConfig::default().with_confidence(1.0).validate(),
            Err(MetricError::InvalidConfidence(_))
        ));
    }

    #[test]
    fn test_pfe_profile_run_is_deterministic() {
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        let config = RiskRunConfig::default().with_num_paths(2000);
        let a = monte_carlo_pfe_profile(
            &portfolio(),
            &models(0.1),
            None,
            &grid,
            &SpotBridge,
            &snapshot(),
            &config,
        )
        .unwrap();
        let b = monte_carlo_pfe_profile(
            &portfolio(),
            &models(0.1),
            None,
            &grid,
            &SpotBridge,
            &snapshot(),
            &config,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.points().len(), 4);
        assert_eq!(a.valuation_date, Some(NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()));
    }

    #[test]
    fn test_var_approaches_parametric_for_small_vol() {
        // Over a short horizon a lognormal is close to normal, so MC VaR
        // of a linear position should land near the parametric figure.
        let horizon = 10.0 / 252.0;
        let grid = TimeGrid::regular(horizon, 1).unwrap();
        let config = RiskRunConfig::default().with_num_paths(50_000);
        let result = monte_carlo_var(
            &portfolio(),
            &models(0.1),
            None,
            &grid,
            &SpotBridge,
            &snapshot(),
            &config,
        )
        .unwrap();

        let sigma = 0.1 * horizon.sqrt();
        let parametric = parametric_var_from_moments(0.0, sigma, 0.95, 1.0).unwrap();
        let expected = parametric.value * 1.10 * 1_000_000.0;
        assert_relative_eq!(result.value, expected, max_relative = 0.05);
        assert!(result.value > 0.0);
        assert_eq!(result.horizon, horizon);
    }

    #[test]
    fn test_cancellation_propagates() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let grid = TimeGrid::regular(1.0, 4).unwrap();
        let err = monte_carlo_pfe_profile_with(
            &portfolio(),
            &models(0.1),
            None,
            &grid,
            &SpotBridge,
            &snapshot(),
            &RiskRunConfig::default(),
            &cancel,
        )
        .unwrap_err();
        assert_eq!(err, MetricError::Cancelled);
    }
}
