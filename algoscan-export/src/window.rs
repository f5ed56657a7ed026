//! Time range partitioning for windowed indexer scans.
//!
//! A large time range is queried one fixed-width window at a time to
//! keep individual requests small enough to avoid indexer timeouts.

use std::fmt;

use anyhow::{Result, ensure};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// An immutable time interval with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Construct a range, rejecting empty or inverted bounds.
    ///
    /// # Errors
    ///
    /// Fails when `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        ensure!(
            start < end,
            "time range start {start} must be before end {end}"
        );
        Ok(Self { start, end })
    }

    /// Lower bound.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Upper bound.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Split the range into adjacent windows of `granularity` width.
    ///
    /// Windows are contiguous (`windows[i].end == windows[i + 1].start`)
    /// and together cover exactly this range. When the range is not an
    /// exact multiple of `granularity`, the final window is truncated to
    /// end at `end` — never beyond it. A range shorter than one
    /// granularity yields a single full-range window.
    ///
    /// # Errors
    ///
    /// Fails when `granularity` is not positive.
    pub fn partition(&self, granularity: Duration) -> Result<Vec<Self>> {
        ensure!(
            granularity > Duration::zero(),
            "window granularity must be positive, got {granularity}"
        );

        let mut windows = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            let next = cursor
                .checked_add_signed(granularity)
                .map_or(self.end, |t| t.min(self.end));
            windows.push(Self {
                start: cursor,
                end: next,
            });
            cursor = next;
        }
        Ok(windows)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}
