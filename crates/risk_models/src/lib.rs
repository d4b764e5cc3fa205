//! # Risk Models (stochastic process layer)
//!
//! Parameter types and one-step transition kernels for the stochastic
//! processes the simulator supports:
//!
//! - **GBM** — geometric Brownian motion, exact lognormal step
//! - **Vasicek** — mean-reverting Ornstein-Uhlenbeck short rate, exact
//!   Gaussian transition
//! - **Hull-White** — one-factor short rate with optional calibrated drift
//! - **Heston** — stochastic volatility with full-truncation Euler variance
//!
//! The closed [`ModelParameters`] enum dispatches over them statically, and
//! [`FactorCorrelation`] carries the cross-factor correlation structure
//! (validation, Cholesky factorisation, nearest-PSD repair) used by the
//! joint sampler.
//!
//! All parameter structs have validating constructors; the simulator
//! re-checks with [`ModelParameters::validate`] before any path work starts
//! so stale hand-built parameters fail fast.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod correlation;
pub mod error;
pub mod model_enum;
pub mod models;

pub use correlation::{CholeskyFactor, FactorCorrelation};
pub use error::{CorrelationError, ModelError};
pub use model_enum::{ModelParameters, ModelState};
pub use models::gbm::GbmParams;
pub use models::heston::HestonParams;
pub use models::hull_white::HullWhiteParams;
pub use models::vasicek::VasicekParams;
