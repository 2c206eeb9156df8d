use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::watch;

use crate::error::LoopFault;
use crate::model::quote::PriceQuote;
use crate::notify::Notifier;
use crate::source::{PriceSource, Watchlist};
use crate::tracker::SlidingWindowTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Processing,
    Sleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleOutcome {
    #[default]
    Completed,
    /// The source failed; nothing was processed.
    FetchFailed,
    /// A panic escaped the cycle; whatever it had done so far stands, the rest is dropped.
    Faulted,
}

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub fetched: usize,
    pub alerts: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub symbol_faults: usize,
}

/// How a single quote ended up, once it made it through the per-symbol guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteOutcome {
    Quiet,
    Delivered,
    DeliveryFailed,
}

impl CycleReport {
    fn with_outcome(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }
}

/// Drives fetch -> observe -> alert -> sleep forever. Owns the tracker; no other task touches it.
pub struct PollLoop<S, N> {
    source: S,
    notifier: N,
    tracker: SlidingWindowTracker,
    watchlist: Option<Watchlist>,
    interval: Duration,
    state: CycleState,
    cycles: u64,
}

impl<S, N> PollLoop<S, N>
where
    S: PriceSource,
    N: Notifier,
{
    pub fn new(
        source: S,
        notifier: N,
        tracker: SlidingWindowTracker,
        watchlist: Option<Watchlist>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            tracker,
            watchlist,
            interval,
            state: CycleState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn tracker(&self) -> &SlidingWindowTracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Best-effort one-off message, e.g. the startup announcement.
    pub async fn announce(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            tracing::warn!(error = %e, "Failed to deliver announcement");
        }
    }

    /// Run cycles until `shutdown` flips to true. A cycle never ends the loop.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            source = self.source.name(),
            interval_secs = self.interval.as_secs(),
            "Poll loop started"
        );

        loop {
            self.state = CycleState::Idle;
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle().await;
            tracing::debug!(
                cycle = self.cycles,
                outcome = ?report.outcome,
                fetched = report.fetched,
                alerts = report.alerts,
                delivered = report.delivered,
                "Cycle finished"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.state = CycleState::Idle;
        tracing::info!(cycles = self.cycles, "Poll loop stopped");
    }

    /// Run exactly one cycle, absorbing every failure into the report. The loop is left in
    /// `Sleeping` whatever happened, ready for the interval wait.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;

        let outcome = AssertUnwindSafe(self.fetch_and_process())
            .catch_unwind()
            .await;
        let report = match outcome {
            Ok(report) => report,
            Err(payload) => {
                let fault = LoopFault::from_panic(payload);
                tracing::error!(cycle = self.cycles, error = %fault, "Cycle aborted");
                CycleReport::with_outcome(CycleOutcome::Faulted)
            }
        };

        self.state = CycleState::Sleeping;
        report
    }

    async fn fetch_and_process(&mut self) -> CycleReport {
        self.state = CycleState::Fetching;
        let quotes = match self.source.fetch(self.watchlist.as_ref()).await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "Price fetch failed, skipping cycle");
                return CycleReport::with_outcome(CycleOutcome::FetchFailed);
            }
        };

        self.state = CycleState::Processing;
        let mut report = CycleReport {
            fetched: quotes.len(),
            ..CycleReport::default()
        };

        for quote in quotes {
            let guarded = AssertUnwindSafe(self.process_quote(&quote))
                .catch_unwind()
                .await;
            match guarded {
                Ok(QuoteOutcome::Quiet) => {}
                Ok(QuoteOutcome::Delivered) => {
                    report.alerts += 1;
                    report.delivered += 1;
                }
                Ok(QuoteOutcome::DeliveryFailed) => {
                    report.alerts += 1;
                    report.failed_deliveries += 1;
                }
                Err(payload) => {
                    report.symbol_faults += 1;
                    let fault = LoopFault::from_panic(payload);
                    tracing::error!(symbol = %quote.symbol, error = %fault, "Failed to process quote");
                }
            }
        }

        report
    }

    /// Observe one quote and, if it crossed the threshold, format and deliver the alert.
    async fn process_quote(&mut self, quote: &PriceQuote) -> QuoteOutcome {
        let Some(event) = self
            .tracker
            .observe(&quote.symbol, quote.timestamp, quote.price)
        else {
            return QuoteOutcome::Quiet;
        };

        tracing::info!(
            symbol = %event.symbol,
            pct = event.pct,
            price = event.current_price,
            baseline = event.baseline_price,
            baseline_at = %event.baseline_timestamp,
            "Windowed move crossed threshold"
        );

        let text = self.tracker.policy().format(&event);
        match self.notifier.send(&text).await {
            Ok(()) => QuoteOutcome::Delivered,
            Err(e) => {
                tracing::warn!(symbol = %event.symbol, error = %e, "Alert delivery failed");
                QuoteOutcome::DeliveryFailed
            }
        }
    }
}
