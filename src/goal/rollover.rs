//! Lazy rollover of the cached spending buckets.
//!
//! There is no scheduled job that clears the daily and weekly totals at
//! midnight. Instead each bucket keeps a watermark recording the period it
//! was last reset for, and stale buckets are rolled the next time the goal
//! state is touched.

use time::Date;

use crate::goal::evaluator::week_bounds;

/// The watermarks recording when each spending bucket was last reset.
///
/// `None` means the bucket has never been reset, e.g. for a new account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetMarks {
    /// The day the daily bucket was last reset.
    pub last_daily_reset: Option<Date>,
    /// The Sunday starting the week the weekly bucket was last reset for.
    pub last_weekly_reset: Option<Date>,
}

/// The result of rolling the reset marks forward to a new date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverOutcome {
    /// The marks after the roll. These always record today and the Sunday
    /// starting the current week.
    pub marks: ResetMarks,
    /// Whether the daily bucket was stale and must be zeroed.
    pub daily_rolled: bool,
    /// Whether the weekly bucket was stale and must be zeroed.
    pub weekly_rolled: bool,
}

/// Compare the watermarks in `marks` against `today` and report which
/// buckets have gone stale.
///
/// The daily bucket rolls when the watermark is any date other than `today`,
/// including the same day number in another month. The weekly bucket rolls
/// when the watermark is not the Sunday starting the week of `today`.
pub fn roll_over(marks: ResetMarks, today: Date) -> RolloverOutcome {
    let week_start = week_bounds(today).start;

    RolloverOutcome {
        marks: ResetMarks {
            last_daily_reset: Some(today),
            last_weekly_reset: Some(week_start),
        },
        daily_rolled: marks.last_daily_reset != Some(today),
        weekly_rolled: marks.last_weekly_reset != Some(week_start),
    }
}
