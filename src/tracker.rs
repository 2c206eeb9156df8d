use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, TimeDelta, Utc};

use crate::alert::AlertPolicy;
use crate::model::change::ChangeEvent;
use crate::model::quote::Sample;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1200;

/// Per-symbol price history over a trailing time window.
///
/// Each symbol's history is ordered by timestamp and bounded twice: samples older than
/// `newest - window` are evicted on every observation, and the history never holds more than
/// `capacity` samples regardless of the window. The baseline for a percent change is the oldest
/// sample still retained, so the measured move approximates "price one window ago" only as
/// closely as the poll cadence allows. Window and threshold both come from the alert policy.
#[derive(Debug, Clone)]
pub struct SlidingWindowTracker {
    policy: AlertPolicy,
    window: TimeDelta,
    capacity: usize,
    registry: HashMap<String, VecDeque<Sample>>,
}

impl SlidingWindowTracker {
    pub fn new(policy: AlertPolicy, capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            window: TimeDelta::from_std(policy.window()).unwrap_or(TimeDelta::MAX),
            policy,
            capacity,
            registry: HashMap::new(),
        }
    }

    /// Record a price and return a change event if the windowed move crosses the threshold.
    ///
    /// Non-positive or non-finite prices are ignored. A timestamp strictly older than the newest
    /// retained sample for the symbol is ignored so the history stays ordered. Equal timestamps
    /// are kept as separate samples.
    pub fn observe(
        &mut self,
        symbol: &str,
        timestamp: DateTime<Utc>,
        price: f64,
    ) -> Option<ChangeEvent> {
        if !price.is_finite() || price <= 0.0 {
            tracing::debug!(symbol, price, "Ignoring non-positive price");
            return None;
        }

        let capacity = self.capacity;
        let history = self
            .registry
            .entry(symbol.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity.min(64)));

        if let Some(newest) = history.back() {
            if timestamp < newest.timestamp {
                tracing::debug!(
                    symbol,
                    %timestamp,
                    newest = %newest.timestamp,
                    "Ignoring out-of-order sample"
                );
                return None;
            }
        }

        history.push_back(Sample { timestamp, price });
        while history.len() > capacity {
            history.pop_front();
        }
        if let Some(cutoff) = timestamp.checked_sub_signed(self.window) {
            while history.front().is_some_and(|s| s.timestamp < cutoff) {
                history.pop_front();
            }
        }

        if history.len() < 2 {
            return None;
        }
        let baseline = *history.front()?;
        if baseline.price <= 0.0 {
            return None;
        }

        let pct = (price - baseline.price) / baseline.price * 100.0;
        tracing::trace!(symbol, pct, baseline = baseline.price, price, "Windowed change");
        if !self.policy.crosses(pct) {
            return None;
        }

        Some(ChangeEvent {
            symbol: symbol.to_string(),
            pct,
            current_price: price,
            baseline_price: baseline.price,
            baseline_timestamp: baseline.timestamp,
            observed_at: timestamp,
        })
    }

    pub fn history(&self, symbol: &str) -> Option<&VecDeque<Sample>> {
        self.registry.get(symbol)
    }

    pub fn symbol_count(&self) -> usize {
        self.registry.len()
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }
}
