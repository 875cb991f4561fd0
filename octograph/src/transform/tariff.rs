use std::ops::Range;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use octograph_domain::domain::{LowRateWindow, RateCatalog, RateCategory, Reading, Tariff};

/// Pure selection of the rate category that applies to a reading.
///
/// Rules:
/// - gas is always `unit_rate`.
/// - electricity without a low-rate window is always `unit_rate_high`.
/// - electricity with a window is `unit_rate_low` when the interval start
///   falls in `[low_start, low_end)` on its own local date, else `unit_rate_high`.
pub fn resolve(reading: &Reading, catalog: &RateCatalog) -> RateCategory {
    let rates = match &catalog.tariff {
        Tariff::Gas(_) => return RateCategory::UnitRate,
        Tariff::Electricity(rates) => rates,
    };

    let Some(window) = &rates.low_rate_window else {
        return RateCategory::UnitRateHigh;
    };

    let period = low_rate_period(reading.interval_start, window);
    if period.contains(&reading.interval_start.with_timezone(&window.zone)) {
        RateCategory::UnitRateLow
    } else {
        RateCategory::UnitRateHigh
    }
}

/// The low-rate period on the local calendar date of `at`.
///
/// Start and end are taken literally on that same date, so a window whose
/// start is after its end (e.g. 23:00-05:00) is empty.
pub fn low_rate_period(at: DateTime<FixedOffset>, window: &LowRateWindow) -> Range<DateTime<Tz>> {
    let date = at.with_timezone(&window.zone).date_naive();
    let start = localize(date.and_time(window.start), window.zone);
    let end = localize(date.and_time(window.end), window.zone);
    start..end
}

/// Local clock time to an instant, the way standard-time localization does it:
/// - a repeated time (clocks going back) is the later, standard-time instant;
/// - a skipped time (clocks going forward) keeps the offset in force before the jump.
fn localize(naive: NaiveDateTime, zone: Tz) -> DateTime<Tz> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(_, standard) => standard,
        LocalResult::None => {
            let before = zone.offset_from_utc_datetime(&(naive - TimeDelta::hours(1))).fix();
            tracing::debug!(%naive, %zone, offset = %before, "low-rate bound in DST gap");
            let utc = naive - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            Utc.from_utc_datetime(&utc).with_timezone(&zone)
        }
    }
}
