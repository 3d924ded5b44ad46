//! Per-symbol precision metadata.
//!
//! Populated once by `load_markets` and read-only afterwards.

use carry_core::{Price, Qty, Symbol};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

/// Precision filters for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Quantity step (LOT_SIZE filter).
    pub qty_step: Qty,
    /// Price tick (PRICE_FILTER).
    pub price_tick: Price,
}

/// Registry of instrument precision, written once at bootstrap.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    inner: RwLock<HashMap<Symbol, Instrument>>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with freshly loaded metadata.
    pub fn replace(&self, instruments: HashMap<Symbol, Instrument>) {
        let mut guard = self.inner.write().expect("instrument registry poisoned");
        *guard = instruments;
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("instrument registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Instrument> {
        self.inner
            .read()
            .expect("instrument registry poisoned")
            .get(symbol)
            .copied()
    }

    /// Round a raw quantity down to the instrument's step. Unknown
    /// symbols pass through unrounded; the venue gets the final say.
    pub fn round_quantity(&self, symbol: &Symbol, qty: Qty) -> Qty {
        match self.get(symbol) {
            Some(instrument) => qty.round_to_step(instrument.qty_step),
            None => {
                warn!(%symbol, "no precision metadata, passing quantity through unrounded");
                qty
            }
        }
    }

    /// Round a raw price down to the instrument's tick.
    pub fn round_price(&self, symbol: &Symbol, price: Price) -> Price {
        match self.get(symbol) {
            Some(instrument) => price.round_to_tick(instrument.price_tick),
            None => {
                warn!(%symbol, "no precision metadata, passing price through unrounded");
                price
            }
        }
    }
}

impl crate::traits::InstrumentRounding for InstrumentRegistry {
    fn round_quantity(&self, symbol: &Symbol, qty: Qty) -> Qty {
        InstrumentRegistry::round_quantity(self, symbol, qty)
    }

    fn round_price(&self, symbol: &Symbol, price: Price) -> Price {
        InstrumentRegistry::round_price(self, symbol, price)
    }
}
