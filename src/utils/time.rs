//! Clock-time arithmetic anchored to a fixed calendar date.
//!
//! Sums and differences of clock times are computed by lifting them onto an
//! arbitrary fixed date, so a sum that crosses midnight wraps via normal
//! date arithmetic instead of producing an ambiguous result.

use chrono::{Duration, NaiveDate, NaiveTime};

/// The anchor date is arbitrary; only its fixedness matters.
fn anchor() -> NaiveDate {
    NaiveDate::default()
}

/// Add a (possibly negative) duration to a clock time, wrapping past
/// midnight in either direction.
pub fn add_to_clock(time: NaiveTime, delta: Duration) -> NaiveTime {
    (anchor().and_time(time) + delta).time()
}

/// Signed duration from clock time `from` to clock time `to`, both lifted
/// onto the anchor date. A result of `-2h` means `to` is two hours before
/// `from` on the same day.
pub fn between_clocks(from: NaiveTime, to: NaiveTime) -> Duration {
    anchor().and_time(to) - anchor().and_time(from)
}

/// Clock time at which step `index` of a horizon begins, given the horizon
/// start and the per-step duration in minutes.
pub fn clock_for_step(start: NaiveTime, step_minutes: u32, index: usize) -> NaiveTime {
    add_to_clock(
        start,
        Duration::minutes(step_minutes as i64 * index as i64),
    )
}
