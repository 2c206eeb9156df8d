use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
    Flat,
}

impl Direction {
    pub fn from_pct(pct: f64) -> Self {
        if pct > 0.0 {
            Self::Increase
        } else if pct < 0.0 {
            Self::Decrease
        } else {
            Self::Flat
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Flat => "unchanged",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A windowed move that crossed the alert threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub symbol: String,
    pub pct: f64,
    pub current_price: f64,
    pub baseline_price: f64,
    pub baseline_timestamp: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn direction(&self) -> Direction {
        Direction::from_pct(self.pct)
    }
}
