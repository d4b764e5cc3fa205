//! Identifier newtypes.
//!
//! Thin `String` wrappers that keep the different identifier spaces
//! (risk factors, positions, netting sets, instruments) from being mixed
//! up at compile time. All of them order and hash by their string value,
//! so they can key `BTreeMap`s deterministically.

use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id! {
    /// Identifier of a market risk factor (e.g. an FX rate, an equity spot,
    /// a short rate).
    RiskFactorId
}

string_id! {
    /// Identifier of a portfolio position.
    PositionId
}

string_id! {
    /// Identifier of a netting set grouping positions for exposure
    /// aggregation.
    NettingSetId
}

string_id! {
    /// Reference to an instrument definition held outside this engine.
    InstrumentId
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_id_equality_and_display() {
        let a = RiskFactorId::new("EURUSD");
        let b = RiskFactorId::from("EURUSD");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "EURUSD");
        assert_eq!(format!("{}", a), "EURUSD");
    }

    #[test]
    fn test_ids_order_deterministically() {
        let mut map = BTreeMap::new();
        map.insert(RiskFactorId::new("USDJPY"), 2);
        map.insert(RiskFactorId::new("EURUSD"), 1);
        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["EURUSD", "USDJPY"]);
    }

    #[test]
    fn test_distinct_id_spaces() {
        // Different newtypes never compare; this is a compile-time property,
        // so just exercise construction of each.
        let _ = PositionId::new("P001");
        let _ = NettingSetId::new("NS001");
        let _ = InstrumentId::new("FX_FWD_EURUSD_1Y");
    }
}
