use std::time::Duration;

use crate::model::change::ChangeEvent;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decides which windowed moves are worth an alert and renders them as text.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    threshold_pct: f64,
    window: Duration,
}

impl AlertPolicy {
    pub fn new(threshold_pct: f64, window: Duration) -> Self {
        Self {
            threshold_pct,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Inclusive threshold test on the absolute percent change.
    pub fn crosses(&self, pct: f64) -> bool {
        pct.is_finite() && pct.abs() >= self.threshold_pct
    }

    pub fn format(&self, event: &ChangeEvent) -> String {
        let window = window_label(self.window);
        format!(
            "🚨 Rapid price move: {}\n\
             {} change: {:+.2}% {}\n\
             Current price: {}\n\
             Baseline price ({} ago): {}\n\
             Time (UTC): {}",
            event.symbol,
            window,
            event.pct,
            event.direction(),
            format_price(event.current_price),
            window,
            format_price(event.baseline_price),
            event.observed_at.format(TIMESTAMP_FORMAT),
        )
    }

    /// One-line announcement sent once when the watcher comes up.
    pub fn startup_message(&self, source_name: &str, poll_interval: Duration) -> String {
        format!(
            "✅ Price mover watcher started ({}): ±{}% within {}, polling every {}",
            source_name,
            self.threshold_pct,
            window_label(self.window),
            window_label(poll_interval),
        )
    }
}

/// Render a duration the way humans name it: "10m", "1h", "45s".
pub fn window_label(window: Duration) -> String {
    let secs = window.as_secs();
    if secs > 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Compact price rendering with six significant digits and no trailing zeros.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return price.to_string();
    }
    if price == 0.0 {
        return "0".to_string();
    }

    // Round to six significant digits before choosing the notation, so 999999.5 becomes 1e6.
    let rounded = format!("{:.5e}", price);
    let Some((mantissa, exponent)) = rounded.split_once('e') else {
        return rounded;
    };
    let Ok(exp) = exponent.parse::<i32>() else {
        return rounded;
    };
    if !(-4..6).contains(&exp) {
        return format!("{}e{}", trim_zeros(mantissa), exp);
    }

    let decimals = (5 - exp).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, price)).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
