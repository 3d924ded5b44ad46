//! Cross-exchange candidate ranking.

use crate::config::ScannerConfig;
use carry_core::{CandidateTicker, Rate, SnapshotPair};
use rust_decimal::Decimal;
use tracing::debug;

/// Ranks tickers whose funding is deeply negative on both venues.
///
/// Pure over its input: scanning the same snapshot pair twice yields
/// the same ordered output, and nothing is mutated or submitted here.
pub struct CandidateScanner {
    config: ScannerConfig,
}

impl CandidateScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Rank the snapshot pair into at most `max_tickers` candidates.
    ///
    /// Stages:
    /// 1. Pre-filter primary quotes against 0.8x the threshold. The
    ///    looser bound keeps the cross-exchange join off the thousands
    ///    of symbols that are never plausible.
    /// 2. Sort ascending by primary rate (most negative first) and
    ///    truncate to the cap.
    /// 3. Join each survivor against the secondary snapshot; a symbol
    ///    the secondary venue does not list is dropped for this cycle.
    /// 4. Keep the ticker only if the mean of both rates is strictly
    ///    below the full threshold. The averaged rate is the actual
    ///    trading signal; the pre-filter was only a gate.
    pub fn scan(&self, pair: &SnapshotPair) -> Vec<CandidateTicker> {
        let threshold = self.config.threshold_fraction();
        let prefilter = threshold * Decimal::new(8, 1);

        let mut survivors: Vec<_> = pair
            .primary
            .values()
            .filter(|quote| quote.rate.inner() < prefilter)
            .collect();
        survivors.sort_by(|a, b| a.rate.cmp(&b.rate));
        survivors.truncate(self.config.max_tickers);

        let mut candidates = Vec::with_capacity(survivors.len());
        for quote in survivors {
            let Some(confirm) = pair.secondary.get(&quote.symbol) else {
                debug!(symbol = %quote.symbol, "not listed on confirmation venue, dropped");
                continue;
            };

            let mean = Rate::mean(quote.rate, confirm.rate);
            if mean.inner() < threshold {
                candidates.push(CandidateTicker {
                    symbol: quote.symbol.clone(),
                    primary_rate: quote.rate,
                    secondary_rate: confirm.rate,
                    mark_price: quote.mark_price,
                });
            } else {
                debug!(
                    symbol = %quote.symbol,
                    mean = %mean,
                    "cross-exchange mean above threshold, dropped"
                );
            }
        }

        candidates
    }
}
