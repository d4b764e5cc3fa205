//! Per-model parameter structs and transition kernels.

pub mod gbm;
pub mod heston;
pub mod hull_white;
pub mod vasicek;
