//! Market snapshot seam.
//!
//! The engine never owns market data; it reads base factor levels and the
//! valuation date through [`MarketSnapshot`]. [`InMemorySnapshot`] is the
//! implementation used by the drivers' tests and by callers that already
//! hold the levels in memory.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use risk_core::RiskFactorId;

/// Read-only view of the current market state.
///
/// Implementations must be `Sync`: the aggregator revalues scenarios in
/// parallel.
pub trait MarketSnapshot: Sync {
    /// Current level of `factor`, if known.
    fn level(&self, factor: &RiskFactorId) -> Option<f64>;

    /// Valuation date the levels refer to.
    fn valuation_date(&self) -> NaiveDate;
}

/// Map-backed snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InMemorySnapshot {
    valuation_date: NaiveDate,
    levels: BTreeMap<RiskFactorId, f64>,
}

impl InMemorySnapshot {
    /// Creates an empty snapshot for `valuation_date`.
    pub fn new(valuation_date: NaiveDate) -> Self {
        Self {
            valuation_date,
            levels: BTreeMap::new(),
        }
    }

    /// Adds or replaces a factor level.
    pub fn with_level(mut self, factor: impl Into<RiskFactorId>, level: f64) -> Self {
        self.levels.insert(factor.into(), level);
        self
    }

    /// All stored levels.
    #[inline]
    pub fn levels(&self) -> &BTreeMap<RiskFactorId, f64> {
        &self.levels
    }
}

impl MarketSnapshot for InMemorySnapshot {
    fn level(&self, factor: &RiskFactorId) -> Option<f64> {
        self.levels.get(factor).copied()
    }

    fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_snapshot() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let snapshot = InMemorySnapshot::new(date)
            .with_level("EURUSD", 1.10)
            .with_level("RATE", 0.03);
        assert_eq!(snapshot.valuation_date(), date);
        assert_eq!(snapshot.level(&RiskFactorId::new("EURUSD")), Some(1.10));
        assert_eq!(snapshot.level(&RiskFactorId::new("MISSING")), None);
    }
}
