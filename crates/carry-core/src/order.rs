//! Order, acknowledgment and fill types.
//!
//! `OrderRequest` is what the lifecycle submits; `OrderAck` is the
//! venue's batch acknowledgment (never trusted for sizing); `Fill` is
//! the authoritative execution record fetched per order.

use crate::decimal::{Price, Qty};
use crate::error::CoreError;
use crate::market::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Hedge-mode position side. Every order this system places rides the
/// short leg; the long variant exists for wire completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Order kind. Market for entries and exits, stop-market for the
/// protective leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    StopMarket {
        /// Trigger price for the protective stop.
        stop_price: Price,
    },
}

impl OrderKind {
    /// Wire name of the order type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::StopMarket { .. } => "STOP_MARKET",
        }
    }

    pub fn stop_price(&self) -> Option<Price> {
        match self {
            Self::Market => None,
            Self::StopMarket { stop_price } => Some(*stop_price),
        }
    }
}

/// Margin mode applied to every order of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarginMode {
    #[default]
    Cross,
    Isolated,
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cross => write!(f, "CROSS"),
            Self::Isolated => write!(f, "ISOLATED"),
        }
    }
}

impl FromStr for MarginMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CROSS" => Ok(Self::Cross),
            "ISOLATED" => Ok(Self::Isolated),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown margin mode: {other}"
            ))),
        }
    }
}

/// Time-in-force. Only the protective stops rest on the book, always GTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    #[serde(rename = "GTC")]
    GoodTilCancelled,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "GTC"),
        }
    }
}

/// Client order ID for idempotency across submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `carry_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("carry_{ts}_{uuid_short}"))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully-specified order ready for batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub kind: OrderKind,
    pub qty: Qty,
    /// Leverage multiplier requested with the order.
    pub leverage: u32,
    pub margin_mode: MarginMode,
    /// Set on resting (stop) orders only.
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: ClientOrderId,
}

impl OrderRequest {
    /// A market order on the short position leg.
    pub fn market(
        symbol: Symbol,
        side: OrderSide,
        qty: Qty,
        leverage: u32,
        margin_mode: MarginMode,
    ) -> Self {
        Self {
            symbol,
            side,
            position_side: PositionSide::Short,
            kind: OrderKind::Market,
            qty,
            leverage,
            margin_mode,
            time_in_force: None,
            client_order_id: ClientOrderId::new(),
        }
    }

    /// A resting stop-market order on the short position leg.
    pub fn stop_market(
        symbol: Symbol,
        side: OrderSide,
        stop_price: Price,
        qty: Qty,
        leverage: u32,
        margin_mode: MarginMode,
    ) -> Self {
        Self {
            symbol,
            side,
            position_side: PositionSide::Short,
            kind: OrderKind::StopMarket { stop_price },
            qty,
            leverage,
            margin_mode,
            time_in_force: Some(TimeInForce::GoodTilCancelled),
            client_order_id: ClientOrderId::new(),
        }
    }
}

/// Venue acknowledgment for one order of a submitted batch.
///
/// Carries identity and timing only. Sizing always comes from the
/// `Fill` fetched afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub update_time: DateTime<Utc>,
}

/// Authoritative execution record for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: Symbol,
    /// Average execution price across all partial fills.
    pub avg_price: Price,
    /// Quantity actually executed; may be below the requested quantity.
    pub executed_qty: Qty,
    pub filled_at: DateTime<Utc>,
}
