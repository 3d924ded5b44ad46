//! Binance USD-M futures client.
//!
//! The entry venue: funding snapshots, instrument precision, signed
//! batch order submission, per-order fill queries and cancellation.
//! Payloads are parsed into typed records here; anything that does not
//! match the expected shape is rejected at this boundary.

use crate::credentials::ApiCredentials;
use crate::error::{GatewayError, GatewayResult};
use crate::instruments::{Instrument, InstrumentRegistry};
use crate::signing::{sign_query, timestamp_ms};
use crate::traits::{FundingSource, InstrumentRounding, TradingGateway};
use async_trait::async_trait;
use carry_core::{
    Exchange, Fill, FundingQuote, FundingSnapshot, OrderAck, OrderId, OrderRequest, Price, Qty,
    Rate, Symbol,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The venue caps one batchOrders request at five orders.
const MAX_ORDERS_PER_BATCH: usize = 5;

/// Connection settings for the USD-M futures API.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST base URL.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// recvWindow for signed requests, in milliseconds.
    pub recv_window_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            timeout: DEFAULT_TIMEOUT,
            recv_window_ms: 5000,
        }
    }
}

/// Binance USD-M futures REST client.
pub struct BinanceUsdm {
    client: Client,
    credentials: ApiCredentials,
    config: BinanceConfig,
    instruments: InstrumentRegistry,
}

impl BinanceUsdm {
    pub fn new(credentials: ApiCredentials, config: BinanceConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            config,
            instruments: InstrumentRegistry::new(),
        })
    }

    fn url(&self, endpoint: &str) -> GatewayResult<reqwest::Url> {
        reqwest::Url::parse(&format!("{}{}", self.config.base_url, endpoint))
            .map_err(|e| GatewayError::Http(format!("invalid URL for {endpoint}: {e}")))
    }

    /// Build a signed URL: url-encode the parameters plus timestamp and
    /// recvWindow, sign the encoded query, append the signature last.
    fn signed_url(&self, endpoint: &str, params: &[(&str, String)]) -> GatewayResult<reqwest::Url> {
        let mut url = self.url(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("timestamp", &timestamp_ms().to_string());
            pairs.append_pair("recvWindow", &self.config.recv_window_ms.to_string());
        }
        let query = url.query().unwrap_or_default().to_string();
        let signature = sign_query(&self.credentials.api_secret, &query);
        url.query_pairs_mut().append_pair("signature", &signature);
        Ok(url)
    }

    async fn read_success_body(response: reqwest::Response) -> GatewayResult<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl FundingSource for BinanceUsdm {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_funding_rates(&self) -> GatewayResult<FundingSnapshot> {
        let url = self.url("/fapi/v1/premiumIndex")?;
        let response = self.client.get(url).send().await?;
        let body = Self::read_success_body(response).await?;
        let snapshot = parse_premium_index(&body)?;
        debug!(symbols = snapshot.len(), "fetched Binance funding snapshot");
        Ok(snapshot)
    }
}

impl InstrumentRounding for BinanceUsdm {
    fn round_quantity(&self, symbol: &Symbol, qty: Qty) -> Qty {
        self.instruments.round_quantity(symbol, qty)
    }

    fn round_price(&self, symbol: &Symbol, price: Price) -> Price {
        self.instruments.round_price(symbol, price)
    }
}

#[async_trait]
impl TradingGateway for BinanceUsdm {
    async fn load_markets(&self) -> GatewayResult<()> {
        let url = self.url("/fapi/v1/exchangeInfo")?;
        let response = self.client.get(url).send().await?;
        let body = Self::read_success_body(response).await?;
        let instruments = parse_exchange_info(&body)?;
        info!(
            instruments = instruments.len(),
            "loaded Binance instrument precision"
        );
        self.instruments.replace(instruments);
        Ok(())
    }

    async fn submit_batch_orders(&self, orders: &[OrderRequest]) -> GatewayResult<Vec<OrderAck>> {
        let mut acks = Vec::with_capacity(orders.len());

        for chunk in orders.chunks(MAX_ORDERS_PER_BATCH) {
            let payload: Vec<Value> = chunk.iter().map(order_to_params).collect();
            let batch_json = serde_json::to_string(&payload)
                .map_err(|e| GatewayError::UnexpectedPayload(format!("batch encode: {e}")))?;

            let url = self.signed_url("/fapi/v1/batchOrders", &[("batchOrders", batch_json)])?;
            let response = self
                .client
                .post(url)
                .header("X-MBX-APIKEY", &self.credentials.api_key)
                .send()
                .await?;
            let body = Self::read_success_body(response).await?;
            acks.extend(parse_batch_response(&body)?);
        }

        Ok(acks)
    }

    async fn fetch_order(&self, order_id: OrderId, symbol: &Symbol) -> GatewayResult<Fill> {
        let url = self.signed_url(
            "/fapi/v1/order",
            &[
                ("symbol", symbol.as_str().to_string()),
                ("orderId", order_id.to_string()),
            ],
        )?;
        let response = self
            .client
            .get(url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        let body = Self::read_success_body(response).await?;
        parse_order_status(&body)
    }

    async fn cancel_order(&self, order_id: OrderId, symbol: &Symbol) -> GatewayResult<()> {
        let url = self.signed_url(
            "/fapi/v1/order",
            &[
                ("symbol", symbol.as_str().to_string()),
                ("orderId", order_id.to_string()),
            ],
        )?;
        let response = self
            .client
            .delete(url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        Self::read_success_body(response).await?;
        Ok(())
    }
}

// ============================================================================
// Wire payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPremiumIndexEntry {
    symbol: String,
    #[serde(rename = "markPrice")]
    mark_price: String,
    #[serde(rename = "lastFundingRate")]
    last_funding_rate: String,
}

#[derive(Debug, Deserialize)]
struct RawExchangeInfo {
    symbols: Vec<RawSymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct RawSymbolInfo {
    symbol: String,
    #[serde(default)]
    filters: Vec<RawFilter>,
}

#[derive(Debug, Deserialize)]
struct RawFilter {
    #[serde(rename = "filterType")]
    filter_type: String,
    #[serde(rename = "tickSize")]
    tick_size: Option<String>,
    #[serde(rename = "stepSize")]
    step_size: Option<String>,
}

/// One element of a batchOrders response: either an acknowledgment or
/// a per-order error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBatchItem {
    Ack(RawOrderAck),
    Error(RawApiError),
}

#[derive(Debug, Deserialize)]
struct RawOrderAck {
    #[serde(rename = "orderId")]
    order_id: u64,
    symbol: String,
    #[serde(rename = "updateTime")]
    update_time: i64,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct RawOrderStatus {
    symbol: String,
    #[serde(rename = "avgPrice")]
    avg_price: String,
    #[serde(rename = "executedQty")]
    executed_qty: String,
    #[serde(rename = "updateTime")]
    update_time: i64,
    status: String,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a premiumIndex response into a funding snapshot.
///
/// Delivery contracts (settlement-suffixed symbols) and entries with
/// unparsable numerics are skipped with a warning.
pub(crate) fn parse_premium_index(body: &str) -> GatewayResult<FundingSnapshot> {
    let entries: Vec<RawPremiumIndexEntry> = serde_json::from_str(body)
        .map_err(|e| GatewayError::UnexpectedPayload(format!("premiumIndex: {e}")))?;

    let mut snapshot = FundingSnapshot::new();
    for entry in entries {
        if entry.symbol.contains('_') {
            continue;
        }
        let (rate, mark_price) = match (
            entry.last_funding_rate.parse::<Rate>(),
            entry.mark_price.parse::<Price>(),
        ) {
            (Ok(rate), Ok(mark_price)) => (rate, mark_price),
            _ => {
                warn!(symbol = %entry.symbol, "skipping quote with unparsable numerics");
                continue;
            }
        };
        let symbol = Symbol::from(entry.symbol);
        snapshot.insert(
            symbol.clone(),
            FundingQuote {
                symbol,
                rate,
                mark_price,
                exchange: Exchange::Binance,
            },
        );
    }
    Ok(snapshot)
}

/// Parse exchangeInfo precision filters into the instrument table.
pub(crate) fn parse_exchange_info(body: &str) -> GatewayResult<HashMap<Symbol, Instrument>> {
    let info: RawExchangeInfo = serde_json::from_str(body)
        .map_err(|e| GatewayError::UnexpectedPayload(format!("exchangeInfo: {e}")))?;

    let mut instruments = HashMap::new();
    for symbol_info in info.symbols {
        let mut qty_step = None;
        let mut price_tick = None;
        for filter in &symbol_info.filters {
            match filter.filter_type.as_str() {
                "LOT_SIZE" => {
                    qty_step = filter.step_size.as_deref().and_then(|s| s.parse().ok());
                }
                "PRICE_FILTER" => {
                    price_tick = filter.tick_size.as_deref().and_then(|s| s.parse().ok());
                }
                _ => {}
            }
        }
        let (Some(qty_step), Some(price_tick)) = (qty_step, price_tick) else {
            continue;
        };
        instruments.insert(
            Symbol::from(symbol_info.symbol),
            Instrument {
                qty_step,
                price_tick,
            },
        );
    }
    Ok(instruments)
}

/// Serialize an order request into the venue's batch element shape.
///
/// All values are strings, which is what the batch endpoint expects.
pub(crate) fn order_to_params(order: &OrderRequest) -> Value {
    let mut params = json!({
        "symbol": order.symbol.as_str(),
        "side": order.side.to_string(),
        "type": order.kind.type_name(),
        "positionSide": order.position_side.to_string(),
        "quantity": order.qty.to_string(),
        "newOrderRespType": "FULL",
        "newClientOrderId": order.client_order_id.as_str(),
        "leverage": order.leverage.to_string(),
        "marginType": order.margin_mode.to_string(),
    });
    let map = params.as_object_mut().expect("order params are an object");
    if let Some(stop_price) = order.kind.stop_price() {
        map.insert("stopPrice".to_string(), Value::from(stop_price.to_string()));
    }
    if let Some(tif) = order.time_in_force {
        map.insert("timeInForce".to_string(), Value::from(tif.to_string()));
    }
    params
}

/// Parse a batchOrders response. Any error element fails the batch.
pub(crate) fn parse_batch_response(body: &str) -> GatewayResult<Vec<OrderAck>> {
    let items: Vec<RawBatchItem> = serde_json::from_str(body)
        .map_err(|e| GatewayError::UnexpectedPayload(format!("batchOrders: {e}")))?;

    let mut acks = Vec::with_capacity(items.len());
    for item in items {
        match item {
            RawBatchItem::Ack(ack) => acks.push(OrderAck {
                order_id: OrderId::new(ack.order_id),
                symbol: Symbol::from(ack.symbol),
                update_time: millis_to_utc(ack.update_time)?,
            }),
            RawBatchItem::Error(err) => {
                return Err(GatewayError::OrderRejected(format!(
                    "{}: {}",
                    err.code, err.msg
                )));
            }
        }
    }
    Ok(acks)
}

/// Parse an order-status response into the authoritative fill record.
pub(crate) fn parse_order_status(body: &str) -> GatewayResult<Fill> {
    let status: RawOrderStatus = serde_json::from_str(body)
        .map_err(|e| GatewayError::UnexpectedPayload(format!("order status: {e}")))?;

    if status.status != "FILLED" {
        debug!(symbol = %status.symbol, status = %status.status, "order not fully filled");
    }

    let avg_price = status
        .avg_price
        .parse::<Price>()
        .map_err(|e| GatewayError::UnexpectedPayload(format!("avgPrice: {e}")))?;
    let executed_qty = status
        .executed_qty
        .parse::<Qty>()
        .map_err(|e| GatewayError::UnexpectedPayload(format!("executedQty: {e}")))?;

    Ok(Fill {
        symbol: Symbol::from(status.symbol),
        avg_price,
        executed_qty,
        filled_at: millis_to_utc(status.update_time)?,
    })
}

fn millis_to_utc(ms: i64) -> GatewayResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| GatewayError::UnexpectedPayload(format!("timestamp out of range: {ms}")))
}
