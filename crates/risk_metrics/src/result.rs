//! Metric result types.

use chrono::NaiveDate;

use crate::error::MetricError;

/// Estimation method of a VaR figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarMethod {
    /// Empirical quantile of observed returns.
    Historical,
    /// Normal approximation from sample or explicit moments.
    Parametric,
    /// Quantile of a simulated P&L distribution.
    MonteCarlo,
}

/// A Value-at-Risk figure.
///
/// Positive values are losses: `value = 12_000` at 95% confidence means a
/// one-in-twenty chance of losing more than 12,000 over the horizon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarResult {
    /// The VaR amount (loss sign convention).
    pub value: f64,
    /// Confidence level in (0, 1).
    pub confidence: f64,
    /// Horizon the figure refers to, in the caller's period unit.
    pub horizon: f64,
    /// Estimation method.
    pub method: VarMethod,
    /// Valuation date, stamped by the drivers from the market snapshot.
    pub valuation_date: Option<NaiveDate>,
}

impl VarResult {
    pub(crate) fn new(value: f64, confidence: f64, horizon: f64, method: VarMethod) -> Self {
        Self {
            value,
            confidence,
            horizon,
            method,
            valuation_date: None,
        }
    }

    /// Stamps the valuation date.
    pub fn with_valuation_date(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }
}

/// Computation method of a PFE profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PfeMethod {
    /// Exposure quantiles of simulated scenario distributions.
    MonteCarlo,
    /// Closed-form factor quantile revalued through the bridge.
    Analytic,
}

/// One point of an exposure profile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PfePoint {
    /// Horizon in year fractions.
    pub time: f64,
    /// Exposure at that horizon, non-negative.
    pub exposure: f64,
}

/// A Potential Future Exposure profile over a time grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PfeProfileResult {
    /// Confidence level in (0, 1).
    pub confidence: f64,
    /// Computation method.
    pub method: PfeMethod,
    /// Valuation date, stamped by the drivers from the market snapshot.
    pub valuation_date: Option<NaiveDate>,
    points: Vec<PfePoint>,
}

impl PfeProfileResult {
    /// Assembles a profile, enforcing strictly increasing horizon points.
    ///
    /// # Errors
    /// [`MetricError::NonMonotonicProfile`] naming the first offending
    /// point.
    pub fn new(
        points: Vec<PfePoint>,
        confidence: f64,
        method: PfeMethod,
    ) -> Result<Self, MetricError> {
        for position in 1..points.len() {
            let previous = points[position - 1].time;
            let current = points[position].time;
            if current <= previous {
                return Err(MetricError::NonMonotonicProfile {
                    position,
                    previous,
                    current,
                });
            }
        }
        Ok(Self {
            confidence,
            method,
            valuation_date: None,
            points,
        })
    }

    /// Stamps the valuation date.
    pub fn with_valuation_date(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }

    /// Profile points in time order.
    #[inline]
    pub fn points(&self) -> &[PfePoint] {
        &self.points
    }

    /// The largest exposure along the profile.
    pub fn peak_exposure(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.exposure)
            .fold(0.0, f64::max)
    }
}
