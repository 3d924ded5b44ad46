//! Core domain types for the funding-carry executor.
//!
//! Everything the other crates exchange lives here: precision-safe
//! decimal wrappers, venue and symbol identifiers, funding snapshots,
//! and the order/fill records that flow through a cycle.

pub mod decimal;
pub mod error;
pub mod funding;
pub mod market;
pub mod order;

pub use decimal::{Price, Qty, Rate};
pub use error::{CoreError, Result};
pub use funding::{CandidateTicker, FundingQuote, FundingSnapshot, SnapshotPair};
pub use market::{Exchange, Symbol};
pub use order::{
    ClientOrderId, Fill, MarginMode, OrderAck, OrderId, OrderKind, OrderRequest, OrderSide,
    PositionSide, TimeInForce,
};
