//! Portfolio data model: positions, netting sets and netting rules.

use std::collections::BTreeMap;

use risk_core::{InstrumentId, NettingSetId, PositionId};
use thiserror::Error;

/// Exposure treatment of a netting set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NettingRule {
    /// Positions offset fully: `exposure = max(sum v_i, 0)`.
    Full,
    /// No offset: `exposure = sum max(v_i, 0)`.
    None,
    /// Netted, then reduced by a collateral threshold before the floor:
    /// `exposure = max(sum v_i - threshold, 0)`.
    PartialWithThreshold(f64),
}

/// A position: an instrument reference, a quantity and a netting set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Position identifier, unique within the portfolio.
    pub id: PositionId,
    /// Reference to the externally defined instrument.
    pub instrument: InstrumentId,
    /// Signed quantity (negative for short positions).
    pub quantity: f64,
    /// Netting set this position belongs to.
    pub netting_set: NettingSetId,
}

impl Position {
    /// Creates a position.
    pub fn new(
        id: impl Into<PositionId>,
        instrument: impl Into<InstrumentId>,
        quantity: f64,
        netting_set: impl Into<NettingSetId>,
    ) -> Self {
        Self {
            id: id.into(),
            instrument: instrument.into(),
            quantity,
            netting_set: netting_set.into(),
        }
    }
}

/// Errors raised by portfolio construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// A portfolio needs at least one position.
    #[error("portfolio must contain at least one position")]
    Empty,

    /// Two positions share an id.
    #[error("duplicate position id: {0}")]
    DuplicatePosition(PositionId),

    /// A netting set was declared twice.
    #[error("duplicate netting set id: {0}")]
    DuplicateNettingSet(NettingSetId),

    /// A position references an undeclared netting set.
    #[error("position `{position}` references undeclared netting set `{netting_set}`")]
    UndeclaredNettingSet {
        /// The offending position.
        position: PositionId,
        /// The missing netting set.
        netting_set: NettingSetId,
    },

    /// Partial-netting thresholds must be finite and non-negative.
    #[error("invalid netting threshold {threshold} for netting set `{netting_set}`")]
    InvalidThreshold {
        /// The netting set with the bad rule.
        netting_set: NettingSetId,
        /// The offending threshold.
        threshold: f64,
    },

    /// A position quantity is NaN or infinite.
    #[error("position `{0}` has a non-finite quantity")]
    NonFiniteQuantity(PositionId),
}

/// A validated portfolio.
///
/// Built through [`PortfolioBuilder`], which guarantees that every
/// position's netting set is declared with a rule, ids are unique, and
/// thresholds are sane.
///
/// # Examples
/// ```
/// use risk_metrics::{NettingRule, Portfolio, Position};
///
/// let portfolio = Portfolio::builder()
///     .netting_set("NS1", NettingRule::Full)
///     .position(Position::new("P1", "FX_FWD", 1_000_000.0, "NS1"))
///     .build()
///     .unwrap();
/// assert_eq!(portfolio.positions().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    positions: Vec<Position>,
    rules: BTreeMap<NettingSetId, NettingRule>,
}

impl Portfolio {
    /// Starts building a portfolio.
    pub fn builder() -> PortfolioBuilder {
        PortfolioBuilder::default()
    }

    /// All positions, in insertion order.
    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Declared netting sets and their rules.
    #[inline]
    pub fn rules(&self) -> &BTreeMap<NettingSetId, NettingRule> {
        &self.rules
    }

    /// The rule of `netting_set`, if declared.
    pub fn rule(&self, netting_set: &NettingSetId) -> Option<NettingRule> {
        self.rules.get(netting_set).copied()
    }

    /// Netting set ids in deterministic (sorted) order.
    pub fn netting_set_ids(&self) -> Vec<NettingSetId> {
        self.rules.keys().cloned().collect()
    }

    /// Positions belonging to `netting_set`.
    pub fn positions_in<'a>(
        &'a self,
        netting_set: &'a NettingSetId,
    ) -> impl Iterator<Item = &'a Position> {
        self.positions
            .iter()
            .filter(move |position| &position.netting_set == netting_set)
    }
}

/// Builder for [`Portfolio`].
#[derive(Debug, Clone, Default)]
pub struct PortfolioBuilder {
    positions: Vec<Position>,
    rules: Vec<(NettingSetId, NettingRule)>,
}

impl PortfolioBuilder {
    /// Declares a netting set with its rule.
    pub fn netting_set(mut self, id: impl Into<NettingSetId>, rule: NettingRule) -> Self {
        self.rules.push((id.into(), rule));
        self
    }

    /// Adds a position.
    pub fn position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    /// Validates and builds the portfolio.
    ///
    /// # Errors
    /// See [`PortfolioError`].
    pub fn build(self) -> Result<Portfolio, PortfolioError> {
        if self.positions.is_empty() {
            return Err(PortfolioError::Empty);
        }

        let mut rules = BTreeMap::new();
        for (id, rule) in self.rules {
            if let NettingRule::PartialWithThreshold(threshold) = rule {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(PortfolioError::InvalidThreshold {
                        netting_set: id,
                        threshold,
                    });
                }
            }
            if rules.insert(id.clone(), rule).is_some() {
                return Err(PortfolioError::DuplicateNettingSet(id));
            }
        }

        for (i, position) in self.positions.iter().enumerate() {
            if !position.quantity.is_finite() {
                return Err(PortfolioError::NonFiniteQuantity(position.id.clone()));
            }
            if self.positions[..i].iter().any(|other| other.id == position.id) {
                return Err(PortfolioError::DuplicatePosition(position.id.clone()));
            }
            if !rules.contains_key(&position.netting_set) {
                return Err(PortfolioError::UndeclaredNettingSet {
                    position: position.id.clone(),
                    netting_set: position.netting_set.clone(),
                });
            }
        }

        Ok(Portfolio {
            positions: self.positions,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: &str, netting_set: &str) -> Position {
        Position::new(id, "INSTR", 1.0, netting_set)
    }

    #[test]
    fn test_build_valid_portfolio() {
        let portfolio = Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .netting_set("NS2", NettingRule::PartialWithThreshold(5.0))
            .position(position("P1", "NS1"))
            .position(position("P2", "NS1"))
            .position(position("P3", "NS2"))
            .build()
            .unwrap();
        assert_eq!(portfolio.positions().len(), 3);
        assert_eq!(portfolio.rule(&NettingSetId::new("NS1")), Some(NettingRule::Full));
        assert_eq!(
            portfolio
                .positions_in(&NettingSetId::new("NS1"))
                .count(),
            2
        );
        assert_eq!(
            portfolio.netting_set_ids(),
            vec![NettingSetId::new("NS1"), NettingSetId::new("NS2")]
        );
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        assert_eq!(
            Portfolio::builder().netting_set("NS1", NettingRule::Full).build(),
            Err(PortfolioError::Empty)
        );
    }

    #[test]
    fn test_undeclared_netting_set_rejected() {
        let err = Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .position(position("P1", "NS9"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PortfolioError::UndeclaredNettingSet { .. }));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let err = Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .position(position("P1", "NS1"))
            .position(position("P1", "NS1"))
            .build()
            .unwrap_err();
        assert_eq!(err, PortfolioError::DuplicatePosition(PositionId::new("P1")));
    }

    #[test]
    fn test_duplicate_netting_set_rejected() {
        let err = Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .netting_set("NS1", NettingRule::None)
            .position(position("P1", "NS1"))
            .build()
            .unwrap_err();
        assert_eq!(err, PortfolioError::DuplicateNettingSet(NettingSetId::new("NS1")));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = Portfolio::builder()
            .netting_set("NS1", NettingRule::PartialWithThreshold(-1.0))
            .position(position("P1", "NS1"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_non_finite_quantity_rejected() {
        let err = Portfolio::builder()
            .netting_set("NS1", NettingRule::Full)
            .position(Position::new("P1", "INSTR", f64::NAN, "NS1"))
            .build()
            .unwrap_err();
        assert_eq!(err, PortfolioError::NonFiniteQuantity(PositionId::new("P1")));
    }
}
