//! Lifecycle coordinator.
//!
//! Drives one cycle's candidates through the full state machine. All
//! symbols move together: one entry batch, one protection batch, one
//! shared holding window, one exit batch. The holding wait blocks the
//! caller, which is what keeps cycles from overlapping.

use crate::error::{LifecycleError, LifecycleResult};
use crate::state::CycleState;
use carry_core::{CandidateTicker, Fill, OrderId, Rate, Symbol};
use carry_gateway::{GatewayError, TradingGateway};
use carry_orders::OrderBatchBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Outcome of one lifecycle run.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Terminal state the run reached.
    pub state: CycleState,
    /// Symbols entered this cycle.
    pub entered: Vec<Symbol>,
    /// Symbols with a protective stop recorded.
    pub protected: Vec<Symbol>,
    /// Symbols flattened at close.
    pub exited: Vec<Symbol>,
    /// Stops whose cancellation failed (usually already triggered).
    pub cancel_failures: Vec<Symbol>,
}

impl CycleReport {
    /// Report for a cycle that had nothing to trade.
    pub fn empty() -> Self {
        Self {
            state: CycleState::Closed,
            entered: Vec::new(),
            protected: Vec::new(),
            exited: Vec::new(),
            cancel_failures: Vec::new(),
        }
    }
}

/// Runs ranked candidates through entry, protection, hold and exit.
pub struct LifecycleCoordinator {
    gateway: Arc<dyn TradingGateway>,
    builder: OrderBatchBuilder,
    /// How long positions stay open. Must be shorter than the trigger
    /// interval or the scheduler would silently delay the next cycle.
    holding: Duration,
}

impl LifecycleCoordinator {
    pub fn new(
        gateway: Arc<dyn TradingGateway>,
        builder: OrderBatchBuilder,
        holding: Duration,
    ) -> Self {
        Self {
            gateway,
            builder,
            holding,
        }
    }

    /// Run one full cycle over the given candidates.
    ///
    /// Errors abort the run with the state it had reached; anything
    /// the venue already accepted stays in place. An entry that got
    /// filled before a protection failure is left open and unprotected,
    /// which is surfaced loudly in the log but never rolled back.
    pub async fn run_cycle(&self, candidates: &[CandidateTicker]) -> LifecycleResult<CycleReport> {
        if candidates.is_empty() {
            return Ok(CycleReport::empty());
        }

        let mut state = CycleState::Building;

        // Funding rates by symbol, for deriving each stop distance.
        // The entry venue's rate drives protection, as it drives entry.
        let rates: HashMap<Symbol, Rate> = candidates
            .iter()
            .map(|c| (c.symbol.clone(), c.primary_rate))
            .collect();

        // Building -> Entered: one atomic entry batch, then fetch the
        // authoritative fill per acknowledgment. Ack payloads are not
        // trusted for sizing.
        let entry_batch = self.builder.entry_orders(candidates, self.gateway.as_ref());
        if entry_batch.is_empty() {
            return Ok(CycleReport::empty());
        }

        let entry_acks = self
            .gateway
            .submit_batch_orders(&entry_batch)
            .await
            .map_err(|e| self.fail(state, "entry", e))?;
        state = self.advance(state, CycleState::Entered);

        let mut fills: Vec<Fill> = Vec::with_capacity(entry_acks.len());
        for ack in &entry_acks {
            let rate_pct = rates
                .get(&ack.symbol)
                .map(|r| r.as_percent())
                .unwrap_or_default();
            info!(
                symbol = %ack.symbol,
                at = %ack.update_time.format("%H:%M:%S"),
                funding_pct = %rate_pct.round_dp(2),
                "market entry submitted"
            );

            let fill = self
                .gateway
                .fetch_order(ack.order_id, &ack.symbol)
                .await
                .map_err(|e| {
                    error!(symbol = %ack.symbol, error = %e, "entry accepted but fill fetch failed");
                    LifecycleError::FillFetch {
                        symbol: ack.symbol.clone(),
                        source: e,
                    }
                })?;
            info!(symbol = %fill.symbol, avg_price = %fill.avg_price, "entry executed");
            fills.push(fill);
        }

        // Entered -> Protected: stops derived from actual fills.
        let mut protection_batch = Vec::with_capacity(fills.len());
        for fill in &fills {
            let rate = rates
                .get(&fill.symbol)
                .copied()
                .ok_or_else(|| LifecycleError::MissingRate(fill.symbol.clone()))?;
            let order = self.builder.protection_order(fill, rate, self.gateway.as_ref());
            info!(
                symbol = %fill.symbol,
                stop_price = %order.kind.stop_price().unwrap_or(fill.avg_price),
                "protective stop prepared"
            );
            protection_batch.push(order);
        }

        let protection_acks = self
            .gateway
            .submit_batch_orders(&protection_batch)
            .await
            .map_err(|e| {
                error!(
                    exposed = fills.len(),
                    "protection submission failed, entries remain open and unprotected"
                );
                self.fail(state, "protection", e)
            })?;

        let stop_ids: HashMap<Symbol, OrderId> = protection_acks
            .iter()
            .map(|ack| (ack.symbol.clone(), ack.order_id))
            .collect();
        state = self.advance(state, CycleState::Protected);

        // Protected -> Held: a plain blocking wait. No supervision, no
        // price checks; the trade bets on time plus a static stop.
        state = self.advance(state, CycleState::Held);
        info!(minutes = self.holding.as_secs() / 60, "holding positions");
        tokio::time::sleep(self.holding).await;

        // Held -> Closed: flatten everything, then clear the stops.
        let exit_batch: Vec<_> = fills
            .iter()
            .map(|fill| self.builder.exit_order(fill, self.gateway.as_ref()))
            .collect();

        let exit_acks = self
            .gateway
            .submit_batch_orders(&exit_batch)
            .await
            .map_err(|e| self.fail(state, "exit", e))?;
        state = self.advance(state, CycleState::Closed);

        let mut cancel_failures = Vec::new();
        for (symbol, order_id) in &stop_ids {
            if let Err(e) = self.gateway.cancel_order(*order_id, symbol).await {
                // Expected when the stop triggered during the hold.
                warn!(%symbol, error = %e, "failed to cancel protective stop");
                cancel_failures.push(symbol.clone());
            }
        }

        for ack in &exit_acks {
            info!(symbol = %ack.symbol, "position closed");
        }

        Ok(CycleReport {
            state,
            entered: entry_acks.iter().map(|a| a.symbol.clone()).collect(),
            protected: protection_acks.iter().map(|a| a.symbol.clone()).collect(),
            exited: exit_acks.iter().map(|a| a.symbol.clone()).collect(),
            cancel_failures,
        })
    }

    fn advance(&self, from: CycleState, to: CycleState) -> CycleState {
        debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
        info!(from = %from, to = %to, "cycle state transition");
        to
    }

    fn fail(&self, state: CycleState, stage: &'static str, source: GatewayError) -> LifecycleError {
        error!(%state, stage, error = %source, "cycle failed");
        LifecycleError::Submission {
            stage,
            state,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carry_core::{
        CandidateTicker, Exchange, FundingSnapshot, OrderAck, OrderKind, OrderRequest, OrderSide,
        Price, Qty,
    };
    use carry_gateway::{FundingSource, GatewayResult, InstrumentRounding};
    use carry_orders::ExecutionConfig;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Recording fake for the trading gateway. Fills every order at a
    /// fixed price, optionally with a reduced executed quantity, and
    /// can be told to fail the nth batch submission or individual
    /// cancellations.
    struct FakeGateway {
        fill_price: Price,
        /// Executed quantity override per symbol (partial fills).
        partial_fills: HashMap<Symbol, Qty>,
        /// 0-based index of the batch submission call that should fail.
        fail_submission_at: Option<usize>,
        /// Symbols whose stop cancellation fails.
        cancel_failures: HashSet<Symbol>,
        submissions: Mutex<Vec<Vec<OrderRequest>>>,
        cancels: Mutex<Vec<Symbol>>,
        requested_qty: Mutex<HashMap<Symbol, Qty>>,
        next_order_id: AtomicU64,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                fill_price: Price::new(dec!(100)),
                partial_fills: HashMap::new(),
                fail_submission_at: None,
                cancel_failures: HashSet::new(),
                submissions: Mutex::new(Vec::new()),
                cancels: Mutex::new(Vec::new()),
                requested_qty: Mutex::new(HashMap::new()),
                next_order_id: AtomicU64::new(1),
            }
        }

        fn submissions(&self) -> Vec<Vec<OrderRequest>> {
            self.submissions.lock().unwrap().clone()
        }

        fn cancels(&self) -> Vec<Symbol> {
            self.cancels.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FundingSource for FakeGateway {
        fn exchange(&self) -> Exchange {
            Exchange::Binance
        }

        async fn fetch_funding_rates(&self) -> GatewayResult<FundingSnapshot> {
            Ok(FundingSnapshot::new())
        }
    }

    impl InstrumentRounding for FakeGateway {
        fn round_quantity(&self, _symbol: &Symbol, qty: Qty) -> Qty {
            qty
        }

        fn round_price(&self, _symbol: &Symbol, price: Price) -> Price {
            price
        }
    }

    #[async_trait]
    impl TradingGateway for FakeGateway {
        async fn load_markets(&self) -> GatewayResult<()> {
            Ok(())
        }

        async fn submit_batch_orders(
            &self,
            orders: &[OrderRequest],
        ) -> GatewayResult<Vec<OrderAck>> {
            let call_index = {
                let mut submissions = self.submissions.lock().unwrap();
                submissions.push(orders.to_vec());
                submissions.len() - 1
            };
            if self.fail_submission_at == Some(call_index) {
                return Err(GatewayError::OrderRejected("-1000: rejected".to_string()));
            }

            let mut requested = self.requested_qty.lock().unwrap();
            Ok(orders
                .iter()
                .map(|order| {
                    requested.insert(order.symbol.clone(), order.qty);
                    OrderAck {
                        order_id: OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst)),
                        symbol: order.symbol.clone(),
                        update_time: chrono::Utc::now(),
                    }
                })
                .collect())
        }

        async fn fetch_order(&self, _order_id: OrderId, symbol: &Symbol) -> GatewayResult<Fill> {
            let requested = self
                .requested_qty
                .lock()
                .unwrap()
                .get(symbol)
                .copied()
                .unwrap_or(Qty::new(dec!(1)));
            let executed = self.partial_fills.get(symbol).copied().unwrap_or(requested);
            Ok(Fill {
                symbol: symbol.clone(),
                avg_price: self.fill_price,
                executed_qty: executed,
                filled_at: chrono::Utc::now(),
            })
        }

        async fn cancel_order(&self, _order_id: OrderId, symbol: &Symbol) -> GatewayResult<()> {
            self.cancels.lock().unwrap().push(symbol.clone());
            if self.cancel_failures.contains(symbol) {
                return Err(GatewayError::Api {
                    status: 400,
                    body: "Unknown order sent.".to_string(),
                });
            }
            Ok(())
        }
    }

    fn candidate(symbol: &str, rate: Decimal) -> CandidateTicker {
        CandidateTicker {
            symbol: Symbol::from(symbol),
            primary_rate: Rate::new(rate),
            secondary_rate: Rate::new(rate),
            mark_price: Price::new(dec!(100)),
        }
    }

    fn coordinator(gateway: Arc<FakeGateway>) -> LifecycleCoordinator {
        LifecycleCoordinator::new(
            gateway,
            OrderBatchBuilder::new(ExecutionConfig::default()),
            Duration::from_millis(0),
        )
    }

    fn symbols(batch: &[OrderRequest]) -> HashSet<Symbol> {
        batch.iter().map(|o| o.symbol.clone()).collect()
    }

    #[tokio::test]
    async fn test_happy_path_enters_protects_and_exits_same_symbols() {
        let gateway = Arc::new(FakeGateway::new());
        let coordinator = coordinator(gateway.clone());

        let candidates = vec![
            candidate("AUSDT", dec!(-0.02)),
            candidate("BUSDT", dec!(-0.015)),
            candidate("CUSDT", dec!(-0.012)),
        ];
        let report = coordinator.run_cycle(&candidates).await.unwrap();

        assert_eq!(report.state, CycleState::Closed);
        assert!(report.cancel_failures.is_empty());

        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 3); // entry, protection, exit

        // Entries are market sells, protections stop-market buys,
        // exits market buys, all over the same symbol set.
        assert!(submissions[0]
            .iter()
            .all(|o| o.side == OrderSide::Sell && o.kind == OrderKind::Market));
        assert!(submissions[1]
            .iter()
            .all(|o| o.side == OrderSide::Buy && o.kind.stop_price().is_some()));
        assert!(submissions[2]
            .iter()
            .all(|o| o.side == OrderSide::Buy && o.kind == OrderKind::Market));

        let entered = symbols(&submissions[0]);
        assert_eq!(entered, symbols(&submissions[1]));
        assert_eq!(entered, symbols(&submissions[2]));
        assert_eq!(report.entered.len(), 3);
        assert_eq!(report.exited.len(), 3);

        // Every recorded stop gets a cancellation attempt.
        assert_eq!(gateway.cancels().len(), 3);
    }

    #[tokio::test]
    async fn test_protection_and_exit_sized_from_partial_fill() {
        let mut gateway = FakeGateway::new();
        // Entry requests 1 (notional 100 / mark 100) but only 0.4 fills.
        gateway
            .partial_fills
            .insert(Symbol::from("AUSDT"), Qty::new(dec!(0.4)));
        let gateway = Arc::new(gateway);
        let coordinator = coordinator(gateway.clone());

        coordinator
            .run_cycle(&[candidate("AUSDT", dec!(-0.02))])
            .await
            .unwrap();

        let submissions = gateway.submissions();
        assert_eq!(submissions[0][0].qty, Qty::new(dec!(1)));
        assert_eq!(submissions[1][0].qty, Qty::new(dec!(0.4)));
        assert_eq!(submissions[2][0].qty, Qty::new(dec!(0.4)));
    }

    #[tokio::test]
    async fn test_stop_price_derived_from_fill_price() {
        let gateway = Arc::new(FakeGateway::new());
        let coordinator = coordinator(gateway.clone());

        coordinator
            .run_cycle(&[candidate("AUSDT", dec!(-0.015))])
            .await
            .unwrap();

        // Fill at 100, rate -1.5% -> stop at 103.
        let submissions = gateway.submissions();
        assert_eq!(
            submissions[1][0].kind.stop_price(),
            Some(Price::new(dec!(103.000)))
        );
    }

    #[tokio::test]
    async fn test_one_cancel_failure_does_not_block_the_rest() {
        let mut gateway = FakeGateway::new();
        gateway.cancel_failures.insert(Symbol::from("BUSDT"));
        let gateway = Arc::new(gateway);
        let coordinator = coordinator(gateway.clone());

        let candidates = vec![
            candidate("AUSDT", dec!(-0.02)),
            candidate("BUSDT", dec!(-0.02)),
            candidate("CUSDT", dec!(-0.02)),
        ];
        let report = coordinator.run_cycle(&candidates).await.unwrap();

        // The exit batch still covered all three and all three
        // cancellations were attempted.
        assert_eq!(report.state, CycleState::Closed);
        assert_eq!(report.exited.len(), 3);
        assert_eq!(gateway.cancels().len(), 3);
        assert_eq!(report.cancel_failures, vec![Symbol::from("BUSDT")]);
    }

    #[tokio::test]
    async fn test_entry_rejection_fails_cycle_before_anything_else() {
        let mut gateway = FakeGateway::new();
        gateway.fail_submission_at = Some(0);
        let gateway = Arc::new(gateway);
        let coordinator = coordinator(gateway.clone());

        let err = coordinator
            .run_cycle(&[candidate("AUSDT", dec!(-0.02))])
            .await
            .unwrap_err();

        match err {
            LifecycleError::Submission { stage, state, .. } => {
                assert_eq!(stage, "entry");
                assert_eq!(state, CycleState::Building);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Only the failed entry submission happened; no protection, no
        // exit, no cancels.
        assert_eq!(gateway.submissions().len(), 1);
        assert!(gateway.cancels().is_empty());
    }

    #[tokio::test]
    async fn test_protection_rejection_leaves_entries_and_stops_cycle() {
        let mut gateway = FakeGateway::new();
        gateway.fail_submission_at = Some(1);
        let gateway = Arc::new(gateway);
        let coordinator = coordinator(gateway.clone());

        let err = coordinator
            .run_cycle(&[candidate("AUSDT", dec!(-0.02))])
            .await
            .unwrap_err();

        match err {
            LifecycleError::Submission { stage, state, .. } => {
                assert_eq!(stage, "protection");
                assert_eq!(state, CycleState::Entered);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Entry went through, protection failed, nothing after ran.
        // The filled entry is left open; no rollback is attempted.
        assert_eq!(gateway.submissions().len(), 2);
        assert!(gateway.cancels().is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_a_noop() {
        let gateway = Arc::new(FakeGateway::new());
        let coordinator = coordinator(gateway.clone());

        let report = coordinator.run_cycle(&[]).await.unwrap();
        assert_eq!(report.state, CycleState::Closed);
        assert!(report.entered.is_empty());
        assert!(gateway.submissions().is_empty());
    }
}
