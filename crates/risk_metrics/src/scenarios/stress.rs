//! Stress scenario construction.

use std::collections::BTreeMap;

use risk_core::RiskFactorId;

use crate::error::ScenarioError;
use crate::scenarios::{Scenario, ScenarioMethod, ScenarioSet};

/// How a shock value modifies a base level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShockKind {
    /// `level + value`
    Absolute,
    /// `level * (1 + value)`
    Relative,
}

/// A shock to one risk factor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shock {
    /// The shocked factor.
    pub factor: RiskFactorId,
    /// Shock convention.
    pub kind: ShockKind,
    /// Shock size (absolute shift, or relative move as a fraction).
    pub value: f64,
}

impl Shock {
    /// Creates an absolute shock: `level + value`.
    pub fn absolute(factor: impl Into<RiskFactorId>, value: f64) -> Self {
        Self {
            factor: factor.into(),
            kind: ShockKind::Absolute,
            value,
        }
    }

    /// Creates a relative shock: `level * (1 + value)`.
    pub fn relative(factor: impl Into<RiskFactorId>, value: f64) -> Self {
        Self {
            factor: factor.into(),
            kind: ShockKind::Relative,
            value,
        }
    }

    fn apply(&self, level: f64) -> f64 {
        match self.kind {
            ShockKind::Absolute => level + self.value,
            ShockKind::Relative => level * (1.0 + self.value),
        }
    }
}

/// A named bundle of shocks applied together as one scenario.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShockSet {
    /// Scenario label (e.g. "EUR -10%, rates +50bp").
    pub label: String,
    /// The shocks; factors not listed keep their base level.
    pub shocks: Vec<Shock>,
}

impl ShockSet {
    /// Creates a shock set.
    pub fn new(label: impl Into<String>, shocks: Vec<Shock>) -> Self {
        Self {
            label: label.into(),
            shocks,
        }
    }

    /// Builds a set of relative shocks from a factor -> move map.
    pub fn from_relative(
        label: impl Into<String>,
        moves: &BTreeMap<RiskFactorId, f64>,
    ) -> Self {
        let shocks = moves
            .iter()
            .map(|(factor, &value)| Shock::relative(factor.clone(), value))
            .collect();
        Self::new(label, shocks)
    }

    /// Builds a set of absolute shocks from a factor -> shift map.
    pub fn from_absolute(
        label: impl Into<String>,
        shifts: &BTreeMap<RiskFactorId, f64>,
    ) -> Self {
        let shocks = shifts
            .iter()
            .map(|(factor, &value)| Shock::absolute(factor.clone(), value))
            .collect();
        Self::new(label, shocks)
    }
}

/// Builds a stress scenario set: one scenario per shock set, weight 1.0.
///
/// Every scenario starts from `current_levels` and overrides the shocked
/// factors; stress scenarios are evaluated independently and never pooled
/// into a probability distribution.
///
/// # Errors
/// - [`ScenarioError::EmptyInput`] without shock sets or factors
/// - [`ScenarioError::UnknownFactor`] when a shock references a factor
///   absent from `current_levels`
pub fn stress_scenarios(
    current_levels: &BTreeMap<RiskFactorId, f64>,
    shock_sets: &[ShockSet],
) -> Result<ScenarioSet, ScenarioError> {
    if current_levels.is_empty() {
        return Err(ScenarioError::EmptyInput("risk factor"));
    }
    if shock_sets.is_empty() {
        return Err(ScenarioError::EmptyInput("shock set"));
    }

    let mut scenarios = Vec::with_capacity(shock_sets.len());
    for shock_set in shock_sets {
        let mut levels = current_levels.clone();
        for shock in &shock_set.shocks {
            let level = levels
                .get_mut(&shock.factor)
                .ok_or_else(|| ScenarioError::UnknownFactor(shock.factor.clone()))?;
            *level = shock.apply(*level);
        }
        scenarios.push(Scenario::new(levels, 1.0));
    }
    Ok(ScenarioSet::from_parts(ScenarioMethod::Stress, scenarios))
}
