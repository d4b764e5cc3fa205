//! Scenario sets: joint risk-factor states for portfolio revaluation.
//!
//! A [`Scenario`] is one joint state of all risk factors with a
//! probability weight; a [`ScenarioSet`] pools scenarios produced by one
//! generation method. Monte Carlo and historical sets satisfy the
//! weights-sum-to-one invariant per time slice; stress scenarios are
//! independent unit-weight revaluations and exempt from it.

pub mod historical;
pub mod stress;

pub use historical::{historical_scenarios, HistoricalOptions, ReturnKind};
pub use stress::{stress_scenarios, Shock, ShockKind, ShockSet};

use std::collections::BTreeMap;

use risk_core::RiskFactorId;
use risk_simulation::PathSet;

use crate::error::ScenarioError;

/// Tolerance of the weights-sum-to-one invariant.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// How a scenario set was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScenarioMethod {
    /// Sampled from simulated paths.
    MonteCarlo,
    /// Resampled from observed historical returns.
    Historical,
    /// Deterministic stress shocks.
    Stress,
}

/// One joint state of the risk factors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    levels: BTreeMap<RiskFactorId, f64>,
    weight: f64,
    time_index: Option<usize>,
}

impl Scenario {
    /// Creates a scenario without a time index (historical, stress).
    pub fn new(levels: BTreeMap<RiskFactorId, f64>, weight: f64) -> Self {
        Self {
            levels,
            weight,
            time_index: None,
        }
    }

    /// Attaches the grid index this scenario was sampled at.
    pub fn with_time_index(mut self, time_index: usize) -> Self {
        self.time_index = Some(time_index);
        self
    }

    /// Level of `factor` in this scenario.
    #[inline]
    pub fn level(&self, factor: &RiskFactorId) -> Option<f64> {
        self.levels.get(factor).copied()
    }

    /// All factor levels.
    #[inline]
    pub fn levels(&self) -> &BTreeMap<RiskFactorId, f64> {
        &self.levels
    }

    /// Probability weight within the owning set.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Grid index this scenario belongs to, for time-profiled sets.
    #[inline]
    pub fn time_index(&self) -> Option<usize> {
        self.time_index
    }
}

/// A pool of scenarios produced by one generation method.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioSet {
    method: ScenarioMethod,
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub(crate) fn from_parts(method: ScenarioMethod, scenarios: Vec<Scenario>) -> Self {
        Self { method, scenarios }
    }

    /// Builds a Monte Carlo scenario set from simulated path sets.
    ///
    /// One scenario per (time index, path), weight `1 / num_paths`. All
    /// path sets must share the grid and the path count; each requested
    /// time index must lie on the grid. Scenario order is time-major, then
    /// path-major, so downstream aggregation is deterministic.
    ///
    /// # Errors
    /// - [`ScenarioError::EmptyInput`] without path sets or time indices
    /// - [`ScenarioError::PathSetMismatch`] on grid/path-count disagreement
    /// - [`ScenarioError::TimeIndexOutOfRange`] for off-grid indices
    pub fn from_path_sets(
        path_sets: &BTreeMap<RiskFactorId, PathSet>,
        time_indices: &[usize],
    ) -> Result<Self, ScenarioError> {
        let first = path_sets
            .values()
            .next()
            .ok_or(ScenarioError::EmptyInput("path set"))?;
        if time_indices.is_empty() {
            return Err(ScenarioError::EmptyInput("time index"));
        }
        let num_paths = first.num_paths();
        let grid_len = first.grid().len();
        for (factor, set) in path_sets {
            if set.grid() != first.grid() {
                return Err(ScenarioError::PathSetMismatch {
                    what: "grid",
                    factor: factor.clone(),
                });
            }
            if set.num_paths() != num_paths {
                return Err(ScenarioError::PathSetMismatch {
                    what: "path count",
                    factor: factor.clone(),
                });
            }
        }
        for &index in time_indices {
            if index >= grid_len {
                return Err(ScenarioError::TimeIndexOutOfRange { index, grid_len });
            }
        }

        let weight = 1.0 / num_paths as f64;
        let mut scenarios = Vec::with_capacity(time_indices.len() * num_paths);
        for &index in time_indices {
            for path in 0..num_paths {
                let levels: BTreeMap<RiskFactorId, f64> = path_sets
                    .iter()
                    .map(|(factor, set)| {
                        let level = set.paths()[path].levels()[index];
                        (factor.clone(), level)
                    })
                    .collect();
                scenarios.push(Scenario::new(levels, weight).with_time_index(index));
            }
        }
        Ok(Self::from_parts(ScenarioMethod::MonteCarlo, scenarios))
    }

    /// Generation method of this set.
    #[inline]
    pub fn method(&self) -> ScenarioMethod {
        self.method
    }

    /// All scenarios.
    #[inline]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Number of scenarios.
    #[inline]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Sorted, de-duplicated time indices present in this set.
    ///
    /// Empty for sets without time structure (historical, stress).
    pub fn time_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .scenarios
            .iter()
            .filter_map(Scenario::time_index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Checks the weights-sum-to-one invariant.
    ///
    /// Weights are grouped per time slice (scenarios without a time index
    /// form one slice) and each group must sum to 1 within
    /// [`WEIGHT_TOLERANCE`]. Stress sets are exempt: their scenarios are
    /// evaluated independently, not pooled into a distribution.
    ///
    /// # Errors
    /// [`ScenarioError::WeightSumMismatch`] naming the offending slice.
    pub fn validate_weights(&self) -> Result<(), ScenarioError> {
        if self.method == ScenarioMethod::Stress {
            return Ok(());
        }
        let mut sums: BTreeMap<Option<usize>, f64> = BTreeMap::new();
        for scenario in &self.scenarios {
            *sums.entry(scenario.time_index()).or_insert(0.0) += scenario.weight();
        }
        for (time_index, sum) in sums {
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(ScenarioError::WeightSumMismatch { time_index, sum });
            }
        }
        Ok(())
    }
}
