//! Elapsed-time decomposition

use std::fmt;

pub const MS_PER_SECOND: u64 = 1_000;
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Elapsed milliseconds split into calendar-style fields
///
/// `days` is unbounded; the other fields wrap at 24/60/60.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimeParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeParts {
    /// Decompose a millisecond count
    pub const fn from_millis(ms: u64) -> Self {
        Self {
            days: ms / MS_PER_DAY,
            hours: (ms / MS_PER_HOUR) % 24,
            minutes: (ms / MS_PER_MINUTE) % 60,
            seconds: (ms / MS_PER_SECOND) % 60,
        }
    }

    /// Whole milliseconds represented by these fields
    pub const fn as_millis(&self) -> u64 {
        self.days * MS_PER_DAY
            + self.hours * MS_PER_HOUR
            + self.minutes * MS_PER_MINUTE
            + self.seconds * MS_PER_SECOND
    }
}

impl From<u64> for TimeParts {
    fn from(ms: u64) -> Self {
        Self::from_millis(ms)
    }
}

impl fmt::Display for TimeParts {
    /// `1d 01:01:01`, or `01:01:01` under a day
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d ", self.days)?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}
