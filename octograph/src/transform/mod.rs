mod cost;
mod tariff;

use chrono::{DateTime, FixedOffset, Utc};
use octograph_domain::domain::{Point, RateCatalog, Reading, Series, Tags};

use crate::pipeline::PipelineError;

pub use cost::{compute_fields, INTERVALS_PER_DAY};
pub use tariff::{low_rate_period, resolve};

/// Turn readings into time-series points, one per reading, in input order.
pub fn assemble(
    series: Series,
    account_name: Option<&str>,
    readings: &[Reading],
    catalog: &RateCatalog,
) -> Result<Vec<Point>, PipelineError> {
    readings
        .iter()
        .map(|reading| {
            let category = resolve(reading, catalog);
            let fields = compute_fields(reading, category, catalog)?;
            Ok(Point {
                series,
                tags: Tags {
                    active_rate: category,
                    time_of_day: time_of_day(reading.interval_start),
                    account_name: account_name.map(str::to_owned),
                },
                timestamp: reading.interval_start,
                fields,
            })
        })
        .collect()
}

/// "HH:MM" of the interval start, in UTC.
pub fn time_of_day(at: DateTime<FixedOffset>) -> String {
    at.with_timezone(&Utc).format("%H:%M").to_string()
}
