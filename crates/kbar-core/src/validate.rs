//! Consistency checks for a stored candle series.

use std::fmt;

use chrono::TimeDelta;

use crate::candle::Candle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesIssue {
    Empty,
    /// Timestamps not strictly ascending at this index.
    NotAscending { index: usize },
    /// Step between candles differs from the first step.
    UnevenStep {
        index: usize,
        expected: TimeDelta,
        found: TimeDelta,
    },
    /// Open does not equal the previous close.
    Discontinuous { index: usize },
    InvalidCandle { index: usize, reason: String },
}

impl fmt::Display for SeriesIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty file"),
            Self::NotAscending { index } => {
                write!(f, "timestamps not strictly ascending at index {index}")
            }
            Self::UnevenStep {
                index,
                expected,
                found,
            } => write!(
                f,
                "interval changes at index {index}: expected {}s, found {}s",
                expected.num_seconds(),
                found.num_seconds()
            ),
            Self::Discontinuous { index } => {
                write!(f, "open does not match previous close at index {index}")
            }
            Self::InvalidCandle { index, reason } => write!(f, "index {index}: {reason}"),
        }
    }
}

/// Check a series for ordering, a constant step, walk continuity and
/// per-candle invariants. The first problem of each ordering kind is reported.
pub fn series_issues(candles: &[Candle]) -> Vec<SeriesIssue> {
    if candles.is_empty() {
        return vec![SeriesIssue::Empty];
    }

    let mut issues = Vec::new();

    for (i, candle) in candles.iter().enumerate() {
        if let Err(e) = candle.validate() {
            issues.push(SeriesIssue::InvalidCandle {
                index: i,
                reason: e.to_string(),
            });
        }
    }

    let expected = candles
        .get(1)
        .map(|second| second.timestamp - candles[0].timestamp);

    for i in 1..candles.len() {
        let found = candles[i].timestamp - candles[i - 1].timestamp;
        if found <= TimeDelta::zero() {
            issues.push(SeriesIssue::NotAscending { index: i });
            break;
        }
        if let Some(expected) = expected
            && found != expected
        {
            issues.push(SeriesIssue::UnevenStep {
                index: i,
                expected,
                found,
            });
            break;
        }
    }

    if let Some(i) = (1..candles.len()).find(|&i| candles[i].open != candles[i - 1].close) {
        issues.push(SeriesIssue::Discontinuous { index: i });
    }

    issues
}
