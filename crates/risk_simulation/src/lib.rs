//! # Risk Simulation (path generation layer)
//!
//! Seeded Monte Carlo path simulation over the models in `risk_models`:
//!
//! - [`SimulationRng`] — `StdRng` wrapper with ziggurat normal sampling and
//!   SplitMix64 per-path seed derivation
//! - [`Path`] / [`PathSet`] — simulated levels aligned 1:1 with a `TimeGrid`
//! - [`simulate`] — single-factor simulation, rayon-parallel across paths
//! - [`sample_joint`] — correlated multi-factor simulation through a
//!   Cholesky factor
//!
//! ## Determinism
//!
//! Every path owns an RNG derived from `(base_seed, path_index)`, so a run
//! is bit-for-bit reproducible for a fixed `(model, grid, num_paths, seed)`
//! regardless of the rayon thread count or work-stealing order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod paths;
pub mod rng;
pub mod sampler;
pub mod simulate;

pub use error::SimulationError;
pub use paths::{Path, PathSet};
pub use rng::{path_seed, SimulationRng};
pub use sampler::{sample_joint, sample_joint_with, DEFAULT_PSD_TOLERANCE};
pub use simulate::{simulate, simulate_with};
