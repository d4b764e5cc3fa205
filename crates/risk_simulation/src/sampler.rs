//! Correlated multi-factor path sampling.
//!
//! Per path and per step the sampler draws one standard normal per factor
//! (the primary drivers), pushes them through the Cholesky factor of the
//! cross-factor correlation, and hands each model its correlated primary
//! plus any extra *independent* normals its `brownian_dim` requires.
//! Heston's internal spot/vol correlation is applied inside its own
//! kernel, so factor-level correlation only touches the primary driver and
//! the marginal law of each factor is unchanged.
//!
//! Factorisation (including nearest-PSD repair) happens once, before the
//! path work fans out.

use std::collections::BTreeMap;

use rayon::prelude::*;
use risk_core::{CancellationToken, RiskFactorId, TimeGrid};
use risk_models::{FactorCorrelation, ModelParameters, ModelState};
use tracing::debug;

use crate::error::SimulationError;
use crate::paths::{Path, PathSet};
use crate::rng::{path_seed, SimulationRng};
use crate::simulate::PATH_BATCH;

/// Default tolerance for nearest-PSD correlation repair: entry adjustments
/// up to one basis point of correlation are accepted silently.
pub const DEFAULT_PSD_TOLERANCE: f64 = 1e-4;

/// Simulates all factors jointly under the given correlation.
///
/// Factor order follows `correlation.ids()`; the returned map holds one
/// [`PathSet`] per factor, all sharing `grid` and `seed`. Determinism
/// matches [`crate::simulate`]: bit-identical output for a fixed input,
/// independent of thread count. A single-factor call degenerates to
/// exactly the stream of [`crate::simulate`].
///
/// # Errors
/// - [`SimulationError::EmptyModelSet`] when `models` is empty
/// - [`SimulationError::FactorMismatch`] when `models` and `correlation`
///   disagree on the factor set
/// - [`SimulationError::InvalidParameter`], [`SimulationError::Correlation`],
///   [`SimulationError::InvalidPathCount`] as in single-factor simulation
pub fn sample_joint(
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: &FactorCorrelation,
    grid: &TimeGrid,
    num_paths: usize,
    seed: u64,
) -> Result<BTreeMap<RiskFactorId, PathSet>, SimulationError> {
    sample_joint_with(
        models,
        correlation,
        grid,
        num_paths,
        seed,
        DEFAULT_PSD_TOLERANCE,
        &CancellationToken::new(),
    )
}

/// [`sample_joint`] with an explicit PSD-repair tolerance and cooperative
/// cancellation.
///
/// # Errors
/// As [`sample_joint`], plus [`SimulationError::Cancelled`].
pub fn sample_joint_with(
    models: &BTreeMap<RiskFactorId, ModelParameters>,
    correlation: &FactorCorrelation,
    grid: &TimeGrid,
    num_paths: usize,
    seed: u64,
    psd_tolerance: f64,
    cancel: &CancellationToken,
) -> Result<BTreeMap<RiskFactorId, PathSet>, SimulationError> {
    if models.is_empty() {
        return Err(SimulationError::EmptyModelSet);
    }
    if num_paths == 0 {
        return Err(SimulationError::InvalidPathCount(num_paths));
    }
    for id in correlation.ids() {
        if !models.contains_key(id) {
            return Err(SimulationError::FactorMismatch {
                factor: id.clone(),
                present_in: "correlation matrix",
                missing_from: "model set",
            });
        }
    }
    for id in models.keys() {
        if correlation.index_of(id).is_none() {
            return Err(SimulationError::FactorMismatch {
                factor: id.clone(),
                present_in: "model set",
                missing_from: "correlation matrix",
            });
        }
    }

    // Layout follows the correlation matrix's row order.
    let ordered: Vec<(&RiskFactorId, &ModelParameters)> = correlation
        .ids()
        .iter()
        .map(|id| (id, &models[id]))
        .collect();
    for (_, model) in &ordered {
        model.validate()?;
    }
    let factor = correlation.factor(psd_tolerance)?;

    debug!(
        factors = ordered.len(),
        num_paths,
        steps = grid.len(),
        seed,
        "sampling joint paths"
    );

    let mut per_path: Vec<Vec<Vec<f64>>> = Vec::with_capacity(num_paths);
    let mut start = 0;
    while start < num_paths {
        if cancel.is_cancelled() {
            return Err(SimulationError::Cancelled);
        }
        let end = (start + PATH_BATCH).min(num_paths);
        let batch: Vec<Vec<Vec<f64>>> = (start..end)
            .into_par_iter()
            .map(|index| generate_joint_path(&ordered, &factor, grid, seed, index as u64))
            .collect();
        per_path.extend(batch);
        start = end;
    }

    // Transpose path-major levels into per-factor path sets.
    let mut result = BTreeMap::new();
    for (factor_index, (id, _)) in ordered.iter().enumerate() {
        let paths: Vec<Path> = per_path
            .iter_mut()
            .map(|levels| Path::new(std::mem::take(&mut levels[factor_index])))
            .collect();
        result.insert((*id).clone(), PathSet::new(grid.clone(), seed, paths));
    }
    Ok(result)
}

/// One joint path; returns factor-major level vectors.
fn generate_joint_path(
    ordered: &[(&RiskFactorId, &ModelParameters)],
    factor: &risk_models::CholeskyFactor,
    grid: &TimeGrid,
    base_seed: u64,
    path_index: u64,
) -> Vec<Vec<f64>> {
    let mut rng = SimulationRng::from_seed(path_seed(base_seed, path_index));
    let num_factors = ordered.len();
    let mut states: Vec<ModelState> =
        ordered.iter().map(|(_, model)| model.initial_state()).collect();
    let mut primaries = vec![0.0_f64; num_factors];
    let mut levels: Vec<Vec<f64>> = (0..num_factors)
        .map(|_| Vec::with_capacity(grid.len()))
        .collect();

    let mut previous = 0.0;
    for &t in grid.times() {
        let dt = t - previous;
        if dt > 0.0 {
            rng.fill_normal(&mut primaries);
            factor.correlate(&mut primaries);
            for (i, (_, model)) in ordered.iter().enumerate() {
                states[i] = match model.brownian_dim() {
                    1 => model.evolve_step(states[i], dt, &[primaries[i]]),
                    _ => {
                        let extra = rng.next_normal();
                        model.evolve_step(states[i], dt, &[primaries[i], extra])
                    }
                };
            }
        }
        for (i, state) in states.iter().enumerate() {
            levels[i].push(state.level());
        }
        previous = t;
    }
    levels
}
