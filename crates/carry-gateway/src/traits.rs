//! Trait seams the core consumes venues through.
//!
//! `FundingSource` is the read-only funding view both venues provide.
//! `TradingGateway` adds the order surface and is only implemented by
//! the entry venue. Tests substitute fakes at these seams.

use crate::error::GatewayResult;
use async_trait::async_trait;
use carry_core::{Exchange, FundingSnapshot, Fill, OrderAck, OrderId, OrderRequest, Price, Qty, Symbol};

/// A venue that can report current funding rates.
#[async_trait]
pub trait FundingSource: Send + Sync {
    /// Which venue this source represents.
    fn exchange(&self) -> Exchange;

    /// Fetch the current funding rate and mark price for every listed
    /// perpetual. Produces a fresh snapshot; never cached.
    async fn fetch_funding_rates(&self) -> GatewayResult<FundingSnapshot>;
}

/// Per-instrument precision capability.
///
/// Rounding is infallible: a symbol missing from the venue metadata is
/// passed through unrounded with a warning, which the venue will then
/// accept or reject on submission.
pub trait InstrumentRounding: Send + Sync {
    fn round_quantity(&self, symbol: &Symbol, qty: Qty) -> Qty;
    fn round_price(&self, symbol: &Symbol, price: Price) -> Price;
}

/// The full order surface of the entry venue.
#[async_trait]
pub trait TradingGateway: FundingSource + InstrumentRounding {
    /// Load instrument metadata (precision filters). Must be called
    /// once before any order is built.
    async fn load_markets(&self) -> GatewayResult<()>;

    /// Submit a batch of orders in as few venue calls as the batch cap
    /// allows. Returns one acknowledgment per accepted order, in
    /// submission order. Any rejected element fails the whole call.
    async fn submit_batch_orders(&self, orders: &[OrderRequest]) -> GatewayResult<Vec<OrderAck>>;

    /// Fetch the authoritative execution record for an accepted order.
    async fn fetch_order(&self, order_id: OrderId, symbol: &Symbol) -> GatewayResult<Fill>;

    /// Cancel a resting order.
    async fn cancel_order(&self, order_id: OrderId, symbol: &Symbol) -> GatewayResult<()>;
}
