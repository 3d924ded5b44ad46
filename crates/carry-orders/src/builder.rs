//! Order batch construction.

use carry_core::{CandidateTicker, Fill, MarginMode, OrderRequest, OrderSide, Price, Qty, Rate};
use carry_gateway::InstrumentRounding;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sizing and margin settings applied to every order of a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Target position size per ticker in USD, independent of leverage.
    #[serde(default = "default_notional_usd")]
    pub notional_usd: Decimal,
    /// Leverage multiplier requested with each order.
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// Margin mode for all orders.
    #[serde(default)]
    pub margin_mode: MarginMode,
}

fn default_notional_usd() -> Decimal {
    Decimal::from(100)
}

fn default_leverage() -> u32 {
    10
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            notional_usd: default_notional_usd(),
            leverage: default_leverage(),
            margin_mode: MarginMode::default(),
        }
    }
}

impl ExecutionConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.notional_usd.is_sign_negative() || self.notional_usd.is_zero() {
            return Err(format!(
                "notional_usd ({}) must be positive",
                self.notional_usd
            ));
        }
        if self.leverage == 0 {
            return Err("leverage must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Builds the three order batches of a cycle.
///
/// Entries are sized from the candidate's mark price and the target
/// notional; protection and exit are sized from the actual fill, never
/// from the quantity originally requested.
pub struct OrderBatchBuilder {
    config: ExecutionConfig,
}

impl OrderBatchBuilder {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Market short entries for every candidate.
    ///
    /// Quantity = notional / mark price, rounded down to the
    /// instrument's step. Candidates without a positive mark price are
    /// skipped; the venue would reject them anyway.
    pub fn entry_orders<R: InstrumentRounding + ?Sized>(
        &self,
        candidates: &[CandidateTicker],
        rounding: &R,
    ) -> Vec<OrderRequest> {
        candidates
            .iter()
            .filter_map(|candidate| {
                if !candidate.mark_price.is_positive() {
                    warn!(symbol = %candidate.symbol, "non-positive mark price, skipping entry");
                    return None;
                }
                let raw_qty = Qty::new(self.config.notional_usd / candidate.mark_price.inner());
                let qty = rounding.round_quantity(&candidate.symbol, raw_qty);
                Some(OrderRequest::market(
                    candidate.symbol.clone(),
                    OrderSide::Sell,
                    qty,
                    self.config.leverage,
                    self.config.margin_mode,
                ))
            })
            .collect()
    }

    /// The protective stop for one filled entry.
    ///
    /// The stop sits on the adverse side at twice the captured funding
    /// rate: with funding at -1.5% the short is stopped out 3% above
    /// the average entry.
    pub fn protection_order<R: InstrumentRounding + ?Sized>(
        &self,
        fill: &Fill,
        rate: Rate,
        rounding: &R,
    ) -> OrderRequest {
        let stop = rounding.round_price(&fill.symbol, stop_price(fill.avg_price, rate));
        let qty = rounding.round_quantity(&fill.symbol, fill.executed_qty);
        OrderRequest::stop_market(
            fill.symbol.clone(),
            OrderSide::Buy,
            stop,
            qty,
            self.config.leverage,
            self.config.margin_mode,
        )
    }

    /// The market exit that flattens one filled entry.
    pub fn exit_order<R: InstrumentRounding + ?Sized>(&self, fill: &Fill, rounding: &R) -> OrderRequest {
        let qty = rounding.round_quantity(&fill.symbol, fill.executed_qty);
        OrderRequest::market(
            fill.symbol.clone(),
            OrderSide::Buy,
            qty,
            self.config.leverage,
            self.config.margin_mode,
        )
    }
}

/// Stop trigger price: `avg_price * (1 + rate * -2)`.
pub fn stop_price(avg_price: Price, rate: Rate) -> Price {
    avg_price * (Decimal::ONE + rate.inner() * Decimal::from(-2))
}
