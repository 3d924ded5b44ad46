//! Funding snapshot fetcher.

use carry_core::SnapshotPair;
use carry_gateway::{FundingSource, GatewayResult};
use std::sync::Arc;
use tracing::debug;

/// Pulls a fresh funding snapshot from both venues.
///
/// Either venue failing fails the whole fetch: a one-sided scan would
/// silently trade on unconfirmed rates. The caller logs the error and
/// treats the cycle as having no candidates; the next trigger retries
/// on its own.
pub struct SnapshotFetcher {
    primary: Arc<dyn FundingSource>,
    secondary: Arc<dyn FundingSource>,
}

impl SnapshotFetcher {
    pub fn new(primary: Arc<dyn FundingSource>, secondary: Arc<dyn FundingSource>) -> Self {
        Self { primary, secondary }
    }

    pub async fn fetch(&self) -> GatewayResult<SnapshotPair> {
        let primary = self.primary.fetch_funding_rates().await?;
        let secondary = self.secondary.fetch_funding_rates().await?;
        debug!(
            primary_venue = %self.primary.exchange(),
            primary_symbols = primary.len(),
            secondary_venue = %self.secondary.exchange(),
            secondary_symbols = secondary.len(),
            "funding snapshots fetched"
        );
        Ok(SnapshotPair::new(primary, secondary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carry_core::{Exchange, FundingQuote, FundingSnapshot, Price, Rate, Symbol};
    use carry_gateway::GatewayError;
    use rust_decimal_macros::dec;

    struct StaticSource {
        exchange: Exchange,
        result: Result<Vec<FundingQuote>, String>,
    }

    #[async_trait]
    impl FundingSource for StaticSource {
        fn exchange(&self) -> Exchange {
            self.exchange
        }

        async fn fetch_funding_rates(&self) -> GatewayResult<FundingSnapshot> {
            match &self.result {
                Ok(quotes) => Ok(quotes
                    .iter()
                    .cloned()
                    .map(|q| (q.symbol.clone(), q))
                    .collect()),
                Err(msg) => Err(GatewayError::Http(msg.clone())),
            }
        }
    }

    fn quote(exchange: Exchange) -> FundingQuote {
        FundingQuote {
            symbol: Symbol::from("BTCUSDT"),
            rate: Rate::new(dec!(-0.012)),
            mark_price: Price::new(dec!(50000)),
            exchange,
        }
    }

    #[tokio::test]
    async fn test_fetch_combines_both_venues() {
        let fetcher = SnapshotFetcher::new(
            Arc::new(StaticSource {
                exchange: Exchange::Binance,
                result: Ok(vec![quote(Exchange::Binance)]),
            }),
            Arc::new(StaticSource {
                exchange: Exchange::Bybit,
                result: Ok(vec![quote(Exchange::Bybit)]),
            }),
        );

        let pair = fetcher.fetch().await.unwrap();
        assert_eq!(pair.primary.len(), 1);
        assert_eq!(pair.secondary.len(), 1);
    }

    #[tokio::test]
    async fn test_secondary_failure_fails_the_fetch() {
        let fetcher = SnapshotFetcher::new(
            Arc::new(StaticSource {
                exchange: Exchange::Binance,
                result: Ok(vec![quote(Exchange::Binance)]),
            }),
            Arc::new(StaticSource {
                exchange: Exchange::Bybit,
                result: Err("connection refused".to_string()),
            }),
        );

        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
