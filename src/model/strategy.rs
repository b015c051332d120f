use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::warn;
use super::config::ConfigError;

// How the provider orders each
// consumer's recommendations
#[derive(Display, EnumIter, PartialEq, Eq, Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[strum(serialize = "consumer_only")]
    ConsumerOnly,
    #[strum(serialize = "balance_equal_weights")]
    BalanceEqualWeights,
    #[strum(serialize = "profit_only")]
    ProfitOnly,
    #[strum(serialize = "balance_unequal_weights")]
    BalanceUnequalWeights,
    #[strum(serialize = "popular_based")]
    PopularBased,
}

impl Strategy {
    // (consumer utility, profit) weights
    // for strategies that blend the two
    pub fn weights(&self) -> Option<(f64, f64)> {
        match self {
            Strategy::BalanceEqualWeights => Some((0.5, 0.5)),
            Strategy::ProfitOnly => Some((0., 1.)),
            Strategy::BalanceUnequalWeights => Some((0.9, 0.1)),
            Strategy::ConsumerOnly | Strategy::PopularBased => None,
        }
    }

    // Unknown names fall back to popularity-based
    // recommendations, unless strict.
    pub fn parse(name: &str, strict: bool) -> Result<Strategy, ConfigError> {
        match Strategy::iter().find(|s| s.to_string() == name) {
            Some(strategy) => Ok(strategy),
            None if strict => Err(ConfigError::UnknownStrategy(name.to_string())),
            None => {
                warn!(strategy = name, fallback = %Strategy::PopularBased, "unknown recommendation strategy");
                Ok(Strategy::PopularBased)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known() {
        for strategy in Strategy::iter() {
            let name = strategy.to_string();
            assert_eq!(Strategy::parse(&name, true), Ok(strategy));
        }
        assert_eq!(Strategy::parse("profit_only", false), Ok(Strategy::ProfitOnly));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Strategy::parse("ProfitOnly", false), Ok(Strategy::PopularBased));
        assert!(Strategy::parse("ProfitOnly", true).is_err());
    }

    #[test]
    fn test_weights() {
        assert_eq!(Strategy::ConsumerOnly.weights(), None);
        assert_eq!(Strategy::PopularBased.weights(), None);
        assert_eq!(Strategy::ProfitOnly.weights(), Some((0., 1.)));
        assert_eq!(Strategy::BalanceUnequalWeights.weights(), Some((0.9, 0.1)));
    }

    #[test]
    fn test_serializes_as_name() {
        let value = serde_json::to_value(Strategy::BalanceEqualWeights).unwrap();
        assert_eq!(value, serde_json::json!("balance_equal_weights"));
    }
}
