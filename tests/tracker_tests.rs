use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use price_mover_watch::alert::AlertPolicy;
use price_mover_watch::model::change::Direction;
use price_mover_watch::tracker::SlidingWindowTracker;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn tracker(threshold_pct: f64) -> SlidingWindowTracker {
    SlidingWindowTracker::new(AlertPolicy::new(threshold_pct, Duration::from_secs(600)), 1200)
}

#[test]
/// A 3% move stays quiet; once the t=0 sample falls out of the window the baseline becomes the
/// t=300 sample and the 104 vs 103 move is under 1%.
fn baseline_moves_forward_as_window_slides() {
    let mut t = tracker(5.0);
    assert!(t.observe("BTCUSDT", at(0), 100.0).is_none());
    assert!(t.observe("BTCUSDT", at(300), 103.0).is_none());
    assert!(t.observe("BTCUSDT", at(650), 104.0).is_none());

    let history = t.history("BTCUSDT").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].timestamp, at(300));
    assert!((history[0].price - 103.0).abs() < f64::EPSILON);
}

#[test]
fn six_percent_rise_fires_increase_event() {
    let mut t = tracker(5.0);
    assert!(t.observe("ETHUSDT", at(0), 1000.0).is_none());
    let ev = t
        .observe("ETHUSDT", at(100), 1060.0)
        .expect("6% move should fire");

    assert_eq!(ev.symbol, "ETHUSDT");
    assert!((ev.pct - 6.0).abs() < 1e-9);
    assert_eq!(ev.direction(), Direction::Increase);
    assert!((ev.baseline_price - 1000.0).abs() < f64::EPSILON);
    assert!((ev.current_price - 1060.0).abs() < f64::EPSILON);
    assert_eq!(ev.baseline_timestamp, at(0));
    assert_eq!(ev.observed_at, at(100));
}

#[test]
fn drop_fires_decrease_event() {
    let mut t = tracker(5.0);
    t.observe("SOLUSDT", at(0), 200.0);
    let ev = t.observe("SOLUSDT", at(60), 180.0).unwrap();
    assert!((ev.pct + 10.0).abs() < 1e-9);
    assert_eq!(ev.direction(), Direction::Decrease);
}

#[test]
/// Threshold boundary is inclusive: exactly T fires, just under does not, just over does.
fn threshold_boundary_is_inclusive() {
    let eps = 1e-6;
    // Baseline 100 keeps pct equal to the price delta, so 105.0 is exactly 5%.
    for (price, fires) in [(105.0, true), (105.0 - eps, false), (105.0 + eps, true)] {
        let mut t = tracker(5.0);
        t.observe("BTCUSDT", at(0), 100.0);
        assert_eq!(
            t.observe("BTCUSDT", at(10), price).is_some(),
            fires,
            "price {}",
            price
        );
    }

    for (price, fires) in [(95.0, true), (95.0 + eps, false), (95.0 - eps, true)] {
        let mut t = tracker(5.0);
        t.observe("BTCUSDT", at(0), 100.0);
        assert_eq!(
            t.observe("BTCUSDT", at(10), price).is_some(),
            fires,
            "price {}",
            price
        );
    }
}

#[test]
fn zero_threshold_fires_on_any_comparison() {
    let mut t = tracker(0.0);
    t.observe("BTCUSDT", at(0), 100.0);
    let ev = t.observe("BTCUSDT", at(1), 100.0).unwrap();
    assert_eq!(ev.direction(), Direction::Flat);
}

#[test]
/// Identical observations are both retained and the second one is evaluated normally.
fn duplicate_observations_are_kept() {
    let mut t = tracker(5.0);
    assert!(t.observe("BTCUSDT", at(0), 100.0).is_none());
    assert!(t.observe("BTCUSDT", at(0), 100.0).is_none());
    assert_eq!(t.history("BTCUSDT").unwrap().len(), 2);

    let ev = t.observe("BTCUSDT", at(0), 110.0).unwrap();
    assert!((ev.pct - 10.0).abs() < 1e-9);
    assert_eq!(t.history("BTCUSDT").unwrap().len(), 3);
}

#[test]
fn history_never_holds_samples_older_than_window() {
    let window = 600;
    let mut t = tracker(50.0);
    let mut now = 0i64;
    for i in 0..500i64 {
        // Irregular cadence: 7..=97 seconds between polls.
        now += 7 + (i * 37) % 91;
        let price = 100.0 + ((i * 13) % 17) as f64;
        t.observe("BTCUSDT", at(now), price);

        let cutoff = at(now) - TimeDelta::seconds(window);
        let history = t.history("BTCUSDT").unwrap();
        assert!(history.iter().all(|s| s.timestamp >= cutoff), "step {}", i);
        assert!(history
            .iter()
            .zip(history.iter().skip(1))
            .all(|(a, b)| a.timestamp <= b.timestamp));
        assert_eq!(history.back().unwrap().timestamp, at(now));
    }
}

#[test]
fn history_never_exceeds_capacity() {
    let cap = 50;
    let mut t = SlidingWindowTracker::new(AlertPolicy::new(5.0, Duration::from_secs(86_400)), cap);
    for i in 0..1_000i64 {
        t.observe("BTCUSDT", at(i), 100.0);
        assert!(t.history("BTCUSDT").unwrap().len() <= cap);
    }
    let history = t.history("BTCUSDT").unwrap();
    assert_eq!(history.len(), cap);
    assert_eq!(history.front().unwrap().timestamp, at(1_000 - cap as i64));
}

#[test]
/// Capacity eviction changes the baseline even while the window still covers older samples.
fn capacity_eviction_moves_baseline() {
    let mut t = SlidingWindowTracker::new(AlertPolicy::new(5.0, Duration::from_secs(600)), 2);
    t.observe("BTCUSDT", at(0), 100.0);
    t.observe("BTCUSDT", at(10), 104.0);
    // With unbounded history the baseline would be 100 (8%); capacity 2 leaves 104 (~3.8%).
    assert!(t.observe("BTCUSDT", at(20), 108.0).is_none());
}

#[test]
fn sample_exactly_on_window_boundary_is_retained() {
    let mut t = tracker(5.0);
    t.observe("BTCUSDT", at(0), 100.0);
    let ev = t.observe("BTCUSDT", at(600), 110.0).unwrap();
    assert_eq!(ev.baseline_timestamp, at(0));

    assert!(t.observe("BTCUSDT", at(601), 110.0).is_none());
    assert_eq!(t.history("BTCUSDT").unwrap().front().unwrap().timestamp, at(600));
}

#[test]
fn cold_start_after_gap_produces_no_event() {
    let mut t = tracker(5.0);
    t.observe("BTCUSDT", at(0), 100.0);
    // Symbol was absent for longer than the window; the old sample is evicted.
    assert!(t.observe("BTCUSDT", at(5_000), 200.0).is_none());
    assert_eq!(t.history("BTCUSDT").unwrap().len(), 1);
}
