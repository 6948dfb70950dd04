use serde::{Deserialize, Serialize};

const DAY_SECS: i64 = 24 * 3600;

/// Look-back window for extremes queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 5] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::All => "all",
        }
    }

    /// Window length in seconds, `None` for an unbounded window.
    pub fn span_secs(&self) -> Option<i64> {
        match self {
            Period::Day => Some(DAY_SECS),
            Period::Week => Some(7 * DAY_SECS),
            Period::Month => Some(30 * DAY_SECS),
            Period::Year => Some(365 * DAY_SECS),
            Period::All => None,
        }
    }

    /// Inclusive `[since, until]` bounds on `fetched_at_epoch` relative to
    /// `now_epoch`.
    pub fn bounds(&self, now_epoch: i64) -> Option<(i64, i64)> {
        self.span_secs().map(|span| (now_epoch - span, now_epoch))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremeOrder {
    Min,
    Max,
}

impl ExtremeOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtremeOrder::Min => "min",
            ExtremeOrder::Max => "max",
        }
    }
}
