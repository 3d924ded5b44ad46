//! Funding-rate snapshot values.
//!
//! A `FundingQuote` is an immutable point-in-time observation of one
//! symbol on one venue; a `SnapshotPair` holds both venues' views for a
//! single scan. `CandidateTicker` is the ranked join of the two.

use crate::decimal::{Price, Rate};
use crate::market::{Exchange, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One venue's funding view of one symbol, produced fresh each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingQuote {
    /// Exchange-native symbol.
    pub symbol: Symbol,
    /// Current funding rate as a fraction (-0.012 = -1.2%).
    pub rate: Rate,
    /// Mark price at observation time.
    pub mark_price: Price,
    /// Venue the quote came from.
    pub exchange: Exchange,
}

/// All quotes from one venue, keyed by symbol.
pub type FundingSnapshot = HashMap<Symbol, FundingQuote>;

/// Both venues' snapshots for a single scan.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPair {
    /// Entry venue (Binance).
    pub primary: FundingSnapshot,
    /// Confirmation venue (Bybit).
    pub secondary: FundingSnapshot,
}

impl SnapshotPair {
    pub fn new(primary: FundingSnapshot, secondary: FundingSnapshot) -> Self {
        Self { primary, secondary }
    }
}

/// A ticker that survived the cross-exchange ranking.
///
/// Exists only between ranking and order construction. The mark price
/// is carried from the primary-venue quote because entries are sized
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTicker {
    pub symbol: Symbol,
    /// Funding rate on the entry venue.
    pub primary_rate: Rate,
    /// Funding rate on the confirmation venue.
    pub secondary_rate: Rate,
    /// Mark price on the entry venue.
    pub mark_price: Price,
}

impl CandidateTicker {
    /// Arithmetic mean of the two venues' rates. This is the trading
    /// signal the final threshold check runs against.
    pub fn mean_rate(&self) -> Rate {
        Rate::mean(self.primary_rate, self.secondary_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mean_rate() {
        let candidate = CandidateTicker {
            symbol: Symbol::from("BTCUSDT"),
            primary_rate: Rate::new(dec!(-0.02)),
            secondary_rate: Rate::new(dec!(-0.018)),
            mark_price: Price::new(dec!(50000)),
        };
        assert_eq!(candidate.mean_rate(), Rate::new(dec!(-0.019)));
    }
}
