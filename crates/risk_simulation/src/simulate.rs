//! Single-factor path simulation.

use rayon::prelude::*;
use risk_core::{CancellationToken, TimeGrid};
use risk_models::ModelParameters;
use tracing::debug;

use crate::error::SimulationError;
use crate::paths::{Path, PathSet};
use crate::rng::{path_seed, SimulationRng};

/// Paths generated between cancellation checks.
pub(crate) const PATH_BATCH: usize = 4096;

/// Simulates `num_paths` trajectories of `model` over `grid`.
///
/// Deterministic: a fixed `(model, grid, num_paths, seed)` reproduces the
/// returned [`PathSet`] bit for bit, independent of the rayon thread
/// count. Parameter validation happens before any path work starts.
///
/// # Errors
/// - [`SimulationError::InvalidParameter`] for invalid model parameters
/// - [`SimulationError::InvalidPathCount`] when `num_paths == 0`
pub fn simulate(
    model: &ModelParameters,
    grid: &TimeGrid,
    num_paths: usize,
    seed: u64,
) -> Result<PathSet, SimulationError> {
    simulate_with(model, grid, num_paths, seed, &CancellationToken::new())
}

/// [`simulate`] with cooperative cancellation, checked between batches of
/// [`PATH_BATCH`] paths.
///
/// # Errors
/// As [`simulate`], plus [`SimulationError::Cancelled`].
pub fn simulate_with(
    model: &ModelParameters,
    grid: &TimeGrid,
    num_paths: usize,
    seed: u64,
    cancel: &CancellationToken,
) -> Result<PathSet, SimulationError> {
    model.validate()?;
    if num_paths == 0 {
        return Err(SimulationError::InvalidPathCount(num_paths));
    }

    debug!(
        model = model.model_name(),
        num_paths,
        steps = grid.len(),
        seed,
        "generating paths"
    );

    let mut paths = Vec::with_capacity(num_paths);
    let mut start = 0;
    while start < num_paths {
        if cancel.is_cancelled() {
            return Err(SimulationError::Cancelled);
        }
        let end = (start + PATH_BATCH).min(num_paths);
        let batch: Vec<Path> = (start..end)
            .into_par_iter()
            .map(|index| generate_path(model, grid, seed, index as u64))
            .collect();
        paths.extend(batch);
        start = end;
    }

    Ok(PathSet::new(grid.clone(), seed, paths))
}

/// Generates one path from its derived per-path seed.
pub(crate) fn generate_path(
    model: &ModelParameters,
    grid: &TimeGrid,
    base_seed: u64,
    path_index: u64,
) -> Path {
    let mut rng = SimulationRng::from_seed(path_seed(base_seed, path_index));
    let dim = model.brownian_dim();
    let mut draws = [0.0_f64; 2];
    let mut state = model.initial_state();
    let mut levels = Vec::with_capacity(grid.len());

    let mut previous = 0.0;
    for &t in grid.times() {
        let dt = t - previous;
        if dt > 0.0 {
            rng.fill_normal(&mut draws[..dim]);
            state = model.evolve_step(state, dt, &draws[..dim]);
        }
        levels.push(state.level());
        previous = t;
    }
    Path::new(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use risk_models::{GbmParams, HestonParams, VasicekParams};

    fn gbm(spot: f64, drift: f64, vol: f64) -> ModelParameters {
        ModelParameters::Gbm(GbmParams::new(spot, drift, vol).unwrap())
    }

    #[test]
    fn test_validation_happens_before_work() {
        let mut params = GbmParams::new(100.0, 0.0, 0.2).unwrap();
        params.volatility = -1.0;
        let grid = TimeGrid::regular(1.0, 10).unwrap();
        let err = simulate(&ModelParameters::Gbm(params), &grid, 100, 1).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_paths_rejected() {
        let grid = TimeGrid::regular(1.0, 10).unwrap();
        let err = simulate(&gbm(100.0, 0.0, 0.2), &grid, 0, 1).unwrap_err();
        assert_eq!(err, SimulationError::InvalidPathCount(0));
    }

    #[test]
    fn test_paths_align_with_grid() {
        let grid = TimeGrid::new(vec![0.0, 0.5, 1.0]).unwrap();
        let set = simulate(&gbm(100.0, 0.0, 0.2), &grid, 8, 1).unwrap();
        assert_eq!(set.num_paths(), 8);
        for path in set.paths() {
            assert_eq!(path.levels().len(), 3);
            // Grid starts at t = 0, so the first level is the spot.
            assert_eq!(path.levels()[0], 100.0);
        }
    }

    #[test]
    fn test_determinism_same_seed() {
        let grid = TimeGrid::regular(1.0, 12).unwrap();
        let model = gbm(100.0, 0.03, 0.25);
        let a = simulate(&model, &grid, 500, 42).unwrap();
        let b = simulate(&model, &grid, 500, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_determinism_across_thread_counts() {
        let grid = TimeGrid::regular(1.0, 12).unwrap();
        let model = gbm(100.0, 0.03, 0.25);
        let parallel = simulate(&model, &grid, 200, 42).unwrap();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let serial = pool.install(|| simulate(&model, &grid, 200, 42).unwrap());
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_different_seeds_differ() {
        let grid = TimeGrid::regular(1.0, 12).unwrap();
        let model = gbm(100.0, 0.03, 0.25);
        let a = simulate(&model, &grid, 100, 1).unwrap();
        let b = simulate(&model, &grid, 100, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_gbm_zero_drift_log_level_means() {
        // E[ln S_t] = ln S_0 - sigma^2 t / 2 under zero drift, at every
        // grid point.
        let grid = TimeGrid::regular(1.0, 12).unwrap();
        let model = gbm(100.0, 0.0, 0.2);
        let set = simulate(&model, &grid, 100_000, 7).unwrap();
        for (step, &t) in grid.times().iter().enumerate() {
            let levels = set.levels_at(step).unwrap();
            let log_mean =
                levels.iter().map(|s| s.ln()).sum::<f64>() / levels.len() as f64;
            let expected = 100.0_f64.ln() - 0.5 * 0.2 * 0.2 * t;
            // Standard error of the log mean is sigma * sqrt(t / n).
            assert_relative_eq!(log_mean, expected, epsilon = 0.005);
        }

        // And E[S_T] = S_0 for the levels themselves.
        let terminals = set.terminals();
        let mean = terminals.iter().sum::<f64>() / terminals.len() as f64;
        assert_relative_eq!(mean, 100.0, max_relative = 0.01);
    }

    #[test]
    fn test_heston_consumes_two_draws_and_stays_valid() {
        let params = HestonParams::new(100.0, 0.0, 0.04, 0.04, 1.5, 0.6, -0.5).unwrap();
        let grid = TimeGrid::regular(1.0, 52).unwrap();
        let set = simulate(&ModelParameters::Heston(params), &grid, 1000, 3).unwrap();
        for path in set.paths() {
            for &level in path.levels() {
                assert!(level > 0.0 && level.is_finite());
            }
        }
    }

    #[test]
    fn test_vasicek_mean_reversion_statistics() {
        // Long horizon: the cross-sectional mean settles near the long rate.
        let params = VasicekParams::new(0.10, 2.0, 0.04, 0.01).unwrap();
        let grid = TimeGrid::regular(5.0, 20).unwrap();
        let set = simulate(&ModelParameters::Vasicek(params), &grid, 20_000, 11).unwrap();
        let terminals = set.terminals();
        let mean = terminals.iter().sum::<f64>() / terminals.len() as f64;
        assert_relative_eq!(mean, 0.04, epsilon = 0.002);
    }

    #[test]
    fn test_cancellation_aborts() {
        let grid = TimeGrid::regular(1.0, 10).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err =
            simulate_with(&gbm(100.0, 0.0, 0.2), &grid, 100, 1, &cancel).unwrap_err();
        assert_eq!(err, SimulationError::Cancelled);
    }
}
