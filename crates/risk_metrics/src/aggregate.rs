//! Exposure aggregation.
//!
//! Revalues every position under every scenario through the
//! [`RevaluationBridge`](crate::reval::RevaluationBridge) and folds the
//! results into exposure distributions per (netting set, time slot) plus a
//! portfolio-level roll-in. Scenarios are processed in parallel with
//! rayon; the fold runs in scenario order so the output is deterministic.
//!
//! Floor-ordering contract per netting rule, for position values `v_i`:
//!
//! - `Full`: `exposure = max(sum v_i, 0)` — floor after netting
//! - `None`: `exposure = sum max(v_i, 0)` — floor each position, then sum
//! - `PartialWithThreshold(h)`: `exposure = max(sum v_i - h, 0)` —
//!   threshold subtracted before the floor
//!
//! `net_value = sum v_i` is recorded alongside in all cases; it is the
//! P&L input of Monte Carlo VaR.

use std::collections::BTreeMap;

use rayon::prelude::*;
use risk_core::{CancellationToken, NettingSetId};
use tracing::debug;

use crate::error::MetricError;
use crate::market::MarketSnapshot;
use crate::portfolio::{NettingRule, Portfolio};
use crate::reval::RevaluationBridge;
use crate::scenarios::ScenarioSet;

/// Scenarios revalued between cancellation checks.
const SCENARIO_BATCH: usize = 256;

/// One revalued scenario's contribution to a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExposureSample {
    /// Scenario weight.
    pub weight: f64,
    /// Netted sum of position values (no floor, no threshold).
    pub net_value: f64,
    /// Exposure after the netting rule's floor contract.
    pub exposure: f64,
}

/// Weighted exposure samples for one (netting set, time slot) cell.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExposureDistribution {
    samples: Vec<ExposureSample>,
}

impl ExposureDistribution {
    /// Builds a distribution from precomputed samples, for callers that
    /// revalue outside the aggregator.
    pub fn from_samples(samples: Vec<ExposureSample>) -> Self {
        Self { samples }
    }

    /// All samples, in scenario order.
    #[inline]
    pub fn samples(&self) -> &[ExposureSample] {
        &self.samples
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the distribution holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Scenario weights.
    pub fn weights(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.weight).collect()
    }

    /// Net values (P&L inputs).
    pub fn net_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.net_value).collect()
    }

    /// Floored exposures.
    pub fn exposures(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.exposure).collect()
    }

    fn push(&mut self, sample: ExposureSample) {
        self.samples.push(sample);
    }
}

/// Aggregated exposure distributions of one run.
///
/// Cells are keyed by time slot: `Some(grid_index)` for Monte Carlo sets,
/// `None` for sets without time structure (historical, stress).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExposureReport {
    netting_sets: BTreeMap<NettingSetId, BTreeMap<Option<usize>, ExposureDistribution>>,
    portfolio: BTreeMap<Option<usize>, ExposureDistribution>,
}

impl ExposureReport {
    /// Distribution of one netting set at one time slot.
    pub fn netting_set(
        &self,
        id: &NettingSetId,
        time_slot: Option<usize>,
    ) -> Option<&ExposureDistribution> {
        self.netting_sets.get(id)?.get(&time_slot)
    }

    /// Portfolio-level distribution at one time slot.
    pub fn portfolio(&self, time_slot: Option<usize>) -> Option<&ExposureDistribution> {
        self.portfolio.get(&time_slot)
    }

    /// Netting sets present in the report, sorted.
    pub fn netting_set_ids(&self) -> Vec<NettingSetId> {
        self.netting_sets.keys().cloned().collect()
    }

    /// Time slots present in the report, sorted (`None` first).
    pub fn time_slots(&self) -> Vec<Option<usize>> {
        self.portfolio.keys().copied().collect()
    }
}

/// Applies the floor contract of `rule` to a netting set's values.
fn apply_rule(rule: NettingRule, net: f64, positive_sum: f64) -> f64 {
    match rule {
        NettingRule::Full => net.max(0.0),
        NettingRule::None => positive_sum,
        NettingRule::PartialWithThreshold(threshold) => (net - threshold).max(0.0),
    }
}

pub(crate) struct ScenarioOutcome {
    pub(crate) time_slot: Option<usize>,
    pub(crate) weight: f64,
    pub(crate) per_set: Vec<(NettingSetId, f64, f64)>,
    pub(crate) portfolio_net: f64,
    pub(crate) portfolio_exposure: f64,
}

/// Values every position under one scenario and applies the netting
/// rules. Shared by the batch aggregator and the analytic PFE path.
pub(crate) fn revalue_scenario(
    portfolio: &Portfolio,
    netting_set_ids: &[NettingSetId],
    scenario: &crate::scenarios::Scenario,
    scenario_index: usize,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
) -> Result<ScenarioOutcome, MetricError> {
    let mut net: BTreeMap<&NettingSetId, f64> = BTreeMap::new();
    let mut positive: BTreeMap<&NettingSetId, f64> = BTreeMap::new();
    for position in portfolio.positions() {
        let value = bridge
            .value(position, scenario, market)
            .map_err(|source| MetricError::Revaluation {
                position: position.id.clone(),
                scenario_index,
                source,
            })?;
        *net.entry(&position.netting_set).or_insert(0.0) += value;
        *positive.entry(&position.netting_set).or_insert(0.0) += value.max(0.0);
    }

    let mut per_set = Vec::with_capacity(netting_set_ids.len());
    let mut portfolio_net = 0.0;
    let mut portfolio_exposure = 0.0;
    for id in netting_set_ids {
        let rule = portfolio
            .rule(id)
            .expect("netting_set_ids come from the rule map");
        let set_net = net.get(id).copied().unwrap_or(0.0);
        let set_positive = positive.get(id).copied().unwrap_or(0.0);
        let exposure = apply_rule(rule, set_net, set_positive);
        portfolio_net += set_net;
        portfolio_exposure += exposure;
        per_set.push((id.clone(), set_net, exposure));
    }

    Ok(ScenarioOutcome {
        time_slot: scenario.time_index(),
        weight: scenario.weight(),
        per_set,
        portfolio_net,
        portfolio_exposure,
    })
}

/// Aggregates a scenario set into exposure distributions.
///
/// # Errors
/// - [`MetricError::Scenario`] when the set violates the weight invariant
/// - [`MetricError::Revaluation`] on the first bridge failure, fail-fast,
///   with position id and scenario index attached
pub fn aggregate(
    portfolio: &Portfolio,
    scenarios: &ScenarioSet,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
) -> Result<ExposureReport, MetricError> {
    aggregate_with(portfolio, scenarios, bridge, market, &CancellationToken::new())
}

/// [`aggregate`] with cooperative cancellation, checked between scenario
/// batches.
///
/// # Errors
/// As [`aggregate`], plus [`MetricError::Cancelled`].
pub fn aggregate_with(
    portfolio: &Portfolio,
    scenarios: &ScenarioSet,
    bridge: &dyn RevaluationBridge,
    market: &dyn MarketSnapshot,
    cancel: &CancellationToken,
) -> Result<ExposureReport, MetricError> {
    scenarios.validate_weights()?;

    debug!(
        scenarios = scenarios.len(),
        positions = portfolio.positions().len(),
        netting_sets = portfolio.rules().len(),
        "aggregating exposures"
    );

    let netting_set_ids = portfolio.netting_set_ids();
    let all = scenarios.scenarios();

    let mut outcomes: Vec<ScenarioOutcome> = Vec::with_capacity(all.len());
    let mut start = 0;
    while start < all.len() {
        if cancel.is_cancelled() {
            return Err(MetricError::Cancelled);
        }
        let end = (start + SCENARIO_BATCH).min(all.len());
        let batch: Result<Vec<ScenarioOutcome>, MetricError> = (start..end)
            .into_par_iter()
            .map(|index| {
                revalue_scenario(portfolio, &netting_set_ids, &all[index], index, bridge, market)
            })
            .collect();
        outcomes.extend(batch?);
        start = end;
    }

    // Deterministic fold in scenario order.
    let mut report = ExposureReport::default();
    for outcome in outcomes {
        for (id, net, exposure) in outcome.per_set {
            report
                .netting_sets
                .entry(id)
                .or_default()
                .entry(outcome.time_slot)
                .or_default()
                .push(ExposureSample {
                    weight: outcome.weight,
                    net_value: net,
                    exposure,
                });
        }
        report
            .portfolio
            .entry(outcome.time_slot)
            .or_default()
            .push(ExposureSample {
                weight: outcome.weight,
                net_value: outcome.portfolio_net,
                exposure: outcome.portfolio_exposure,
            });
    }
    Ok(report)
}
