//! Bybit linear-perpetuals client.
//!
//! Confirmation venue only: the scanner averages its funding rates
//! against the entry venue's, and nothing is ever traded here. The
//! tickers endpoint is public, so no credentials are required.

use crate::error::{GatewayError, GatewayResult};
use crate::traits::FundingSource;
use async_trait::async_trait;
use carry_core::{Exchange, FundingQuote, FundingSnapshot, Price, Rate, Symbol};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for the Bybit v5 API.
#[derive(Debug, Clone)]
pub struct BybitConfig {
    /// REST base URL.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Bybit linear-perpetuals REST client.
pub struct Bybit {
    client: Client,
    config: BybitConfig,
}

impl Bybit {
    pub fn new(config: BybitConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl FundingSource for Bybit {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_funding_rates(&self) -> GatewayResult<FundingSnapshot> {
        let url = format!(
            "{}/v5/market/tickers?category=linear",
            self.config.base_url
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let snapshot = parse_tickers(&body)?;
        debug!(symbols = snapshot.len(), "fetched Bybit funding snapshot");
        Ok(snapshot)
    }
}

// ============================================================================
// Wire payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawTickersResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: RawTickersResult,
}

#[derive(Debug, Deserialize)]
struct RawTickersResult {
    #[serde(default)]
    list: Vec<RawTicker>,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    symbol: String,
    #[serde(rename = "fundingRate", default)]
    funding_rate: String,
    #[serde(rename = "markPrice", default)]
    mark_price: String,
}

/// Parse a v5 tickers response into a funding snapshot.
///
/// Non-perpetual listings report an empty funding rate and are
/// skipped; other unparsable entries are dropped with a warning.
pub(crate) fn parse_tickers(body: &str) -> GatewayResult<FundingSnapshot> {
    let response: RawTickersResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::UnexpectedPayload(format!("tickers: {e}")))?;

    if response.ret_code != 0 {
        return Err(GatewayError::Api {
            status: 200,
            body: format!("retCode {}: {}", response.ret_code, response.ret_msg),
        });
    }

    let mut snapshot = FundingSnapshot::new();
    for ticker in response.result.list {
        if ticker.funding_rate.is_empty() {
            continue;
        }
        let (rate, mark_price) = match (
            ticker.funding_rate.parse::<Rate>(),
            ticker.mark_price.parse::<Price>(),
        ) {
            (Ok(rate), Ok(mark_price)) => (rate, mark_price),
            _ => {
                warn!(symbol = %ticker.symbol, "skipping ticker with unparsable numerics");
                continue;
            }
        };
        let symbol = Symbol::from(ticker.symbol);
        snapshot.insert(
            symbol.clone(),
            FundingQuote {
                symbol,
                rate,
                mark_price,
                exchange: Exchange::Bybit,
            },
        );
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_tickers() {
        let body = r#"{
            "retCode":0,"retMsg":"OK",
            "result":{"category":"linear","list":[
                {"symbol":"BTCUSDT","fundingRate":"-0.00018","markPrice":"50010.5"},
                {"symbol":"BTCUSDT-26SEP25","fundingRate":"","markPrice":"50500.0"},
                {"symbol":"ETHUSDT","fundingRate":"0.0001","markPrice":"3000.1"}
            ]}
        }"#;
        let snapshot = parse_tickers(body).unwrap();
        assert_eq!(snapshot.len(), 2);

        let btc = &snapshot[&Symbol::from("BTCUSDT")];
        assert_eq!(btc.rate, Rate::new(dec!(-0.00018)));
        assert_eq!(btc.exchange, Exchange::Bybit);
    }

    #[test]
    fn test_parse_tickers_error_code() {
        let body = r#"{"retCode":10002,"retMsg":"invalid request","result":{"list":[]}}"#;
        let err = parse_tickers(body).unwrap_err();
        assert!(err.to_string().contains("10002"));
    }
}
