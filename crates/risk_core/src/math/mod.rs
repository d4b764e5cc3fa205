//! Numeric helpers shared across the risk engine.

pub mod distributions;
pub mod quantile;
pub mod stats;

pub use distributions::{norm_cdf, norm_pdf, norm_ppf};
pub use quantile::{quantile, weighted_quantile};
pub use stats::{mean, sample_std};
