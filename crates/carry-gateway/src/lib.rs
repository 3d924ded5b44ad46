//! Exchange gateway capability.
//!
//! The rest of the system consumes venues exclusively through the
//! trait seams in [`traits`]; the concrete REST clients here are the
//! only code that knows about endpoints, signing or payload shapes.
//! Wire payloads are mapped to typed records at this boundary and
//! unexpected shapes are rejected instead of propagated inward.

pub mod binance;
pub mod bybit;
pub mod credentials;
pub mod error;
pub mod instruments;
pub mod signing;
pub mod traits;

pub use binance::BinanceUsdm;
pub use bybit::Bybit;
pub use credentials::ApiCredentials;
pub use error::{GatewayError, GatewayResult};
pub use instruments::{Instrument, InstrumentRegistry};
pub use traits::{FundingSource, InstrumentRounding, TradingGateway};
