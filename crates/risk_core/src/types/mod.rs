//! Core data types: identifiers and time grids.

pub mod ids;
pub mod time;

pub use ids::{InstrumentId, NettingSetId, PositionId, RiskFactorId};
pub use time::{TimeGrid, TimeGridError};
