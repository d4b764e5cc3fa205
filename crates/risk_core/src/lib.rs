//! # Risk Core (foundation layer)
//!
//! Shared building blocks for the risk engine:
//! - Identifier newtypes (`RiskFactorId`, `PositionId`, `NettingSetId`, `InstrumentId`)
//! - `TimeGrid`: validated simulation horizons in year fractions
//! - Numeric helpers: standard normal pdf/cdf/inverse-cdf, quantile estimators,
//!   sample statistics
//! - `CancellationToken` for cooperative abort of long-running computations
//!
//! This crate has no knowledge of models, scenarios or metrics; everything
//! here is consumed by the layers above (`risk_models`, `risk_simulation`,
//! `risk_metrics`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cancel;
pub mod math;
pub mod types;

pub use cancel::CancellationToken;
pub use types::ids::{InstrumentId, NettingSetId, PositionId, RiskFactorId};
pub use types::time::{TimeGrid, TimeGridError};
