//! Application wiring and the trigger loop.
//!
//! One sequential loop owns all trading: wait for the next funding
//! trigger, scan, run the lifecycle (whose holding wait blocks this
//! loop), repeat. A separate read-only poll task previews candidates
//! between triggers.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::schedule::next_trigger_after;
use carry_gateway::{ApiCredentials, BinanceUsdm, Bybit, FundingSource, TradingGateway};
use carry_lifecycle::LifecycleCoordinator;
use carry_orders::OrderBatchBuilder;
use carry_scanner::{CandidateScanner, SnapshotFetcher};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The wired-up funding-carry executor.
pub struct Application {
    config: AppConfig,
    binance: Arc<BinanceUsdm>,
    bybit: Arc<Bybit>,
    fetcher: SnapshotFetcher,
    scanner: CandidateScanner,
    coordinator: LifecycleCoordinator,
}

impl Application {
    /// Construct all components from configuration and environment
    /// credentials. No network calls happen here; `run_preflight`
    /// performs the venue bootstrap.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let credentials = ApiCredentials::from_env("BINANCE_API_KEY", "BINANCE_API_SECRET")?;
        let binance = Arc::new(BinanceUsdm::new(credentials, (&config.binance).into())?);
        let bybit = Arc::new(Bybit::new((&config.bybit).into())?);

        let fetcher = SnapshotFetcher::new(
            binance.clone() as Arc<dyn FundingSource>,
            bybit.clone() as Arc<dyn FundingSource>,
        );
        let scanner = CandidateScanner::new(config.scanner.clone());
        let coordinator = LifecycleCoordinator::new(
            binance.clone() as Arc<dyn TradingGateway>,
            OrderBatchBuilder::new(config.execution.clone()),
            config.holding_duration(),
        );

        info!(
            notional = %config.execution.notional_usd,
            leverage = config.execution.leverage,
            margin_mode = %config.execution.margin_mode,
            max_tickers = config.scanner.max_tickers,
            threshold_pct = %config.scanner.min_funding_rate_pct,
            reset_hours = config.funding_reset_hours,
            holding_minutes = config.holding_minutes,
            "application configured"
        );

        Ok(Self {
            config,
            binance,
            bybit,
            fetcher,
            scanner,
            coordinator,
        })
    }

    /// Load venue metadata required before any order can be sized.
    pub async fn run_preflight(&self) -> AppResult<()> {
        self.binance.load_markets().await?;
        Ok(())
    }

    /// Run forever: informational poll in the background, trading
    /// cycles on funding triggers in this task.
    pub async fn run(self) -> AppResult<()> {
        tokio::spawn(poll_loop(
            SnapshotFetcher::new(
                self.binance.clone() as Arc<dyn FundingSource>,
                self.bybit.clone() as Arc<dyn FundingSource>,
            ),
            CandidateScanner::new(self.config.scanner.clone()),
            self.config.clone(),
        ));

        loop {
            let trigger = next_trigger_after(
                Utc::now(),
                self.config.funding_reset_hours,
                self.config.lead_duration(),
            );
            info!(trigger = %trigger.format("%Y-%m-%d %H:%M:%S"), "waiting for next funding trigger");

            let wait = (trigger - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            self.run_once().await;
        }
    }

    /// One full scan-rank-trade cycle. Failures end the cycle; the
    /// next trigger starts clean.
    async fn run_once(&self) {
        info!(at = %Utc::now().format("%H:%M:%S"), "cycle triggered");

        let pair = match self.fetcher.fetch().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "snapshot fetch failed, skipping cycle");
                return;
            }
        };

        let candidates = self.scanner.scan(&pair);
        if candidates.is_empty() {
            info!(
                threshold_pct = %self.config.scanner.min_funding_rate_pct,
                "no tickers below the funding threshold"
            );
            return;
        }

        match self.coordinator.run_cycle(&candidates).await {
            Ok(report) => info!(
                state = %report.state,
                entered = report.entered.len(),
                exited = report.exited.len(),
                cancel_failures = report.cancel_failures.len(),
                "cycle complete"
            ),
            Err(e) => error!(error = %e, "cycle failed"),
        }
    }
}

/// Read-only candidate preview between triggers. Re-fetches and
/// re-ranks on a fixed interval purely for operator visibility; never
/// trades.
async fn poll_loop(fetcher: SnapshotFetcher, scanner: CandidateScanner, config: AppConfig) {
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(config.poll_interval_secs));

    loop {
        ticker.tick().await;

        let next = next_trigger_after(
            Utc::now(),
            config.funding_reset_hours,
            config.lead_duration(),
        );
        info!(next_run = %next.format("%H:%M:%S"), "next funding trigger");

        let pair = match fetcher.fetch().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "informational poll fetch failed");
                continue;
            }
        };

        let candidates = scanner.scan(&pair);
        if candidates.is_empty() {
            info!(
                threshold_pct = %scanner.config().min_funding_rate_pct,
                "no tickers below the funding threshold"
            );
            continue;
        }
        for candidate in &candidates {
            info!(
                symbol = %candidate.symbol,
                funding_pct = %candidate.primary_rate.as_percent().round_dp(2),
                "will be shorted on the next funding reset"
            );
        }
    }
}
