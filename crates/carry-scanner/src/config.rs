//! Scanner configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the cross-exchange funding scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Funding threshold on the percent scale: -1 means -1% per
    /// settlement. Comparisons divide by 100; the configured value
    /// stays in percent because that is how operators quote funding.
    #[serde(default = "default_min_funding_rate_pct")]
    pub min_funding_rate_pct: Decimal,
    /// Maximum number of tickers traded per cycle.
    #[serde(default = "default_max_tickers")]
    pub max_tickers: usize,
}

fn default_min_funding_rate_pct() -> Decimal {
    Decimal::from(-1) // -1%
}

fn default_max_tickers() -> usize {
    3
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_funding_rate_pct: default_min_funding_rate_pct(),
            max_tickers: default_max_tickers(),
        }
    }
}

impl ScannerConfig {
    /// Validate configuration values.
    ///
    /// The threshold must be negative (the system only shorts negative
    /// funding) and the cap must allow at least one ticker.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_funding_rate_pct.is_sign_positive() || self.min_funding_rate_pct.is_zero() {
            return Err(format!(
                "min_funding_rate_pct ({}) must be negative",
                self.min_funding_rate_pct
            ));
        }
        if self.max_tickers == 0 {
            return Err("max_tickers must be at least 1".to_string());
        }
        Ok(())
    }

    /// The threshold converted to the fraction scale used against raw
    /// funding rates.
    pub fn threshold_fraction(&self) -> Decimal {
        self.min_funding_rate_pct / Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.min_funding_rate_pct, dec!(-1));
        assert_eq!(config.max_tickers, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_fraction() {
        let config = ScannerConfig {
            min_funding_rate_pct: dec!(-1),
            ..Default::default()
        };
        assert_eq!(config.threshold_fraction(), dec!(-0.01));
    }

    #[test]
    fn test_validate_rejects_positive_threshold() {
        let config = ScannerConfig {
            min_funding_rate_pct: dec!(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = ScannerConfig {
            min_funding_rate_pct: dec!(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let config = ScannerConfig {
            max_tickers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
