use chrono::Utc;
use octograph_domain::domain::{AgileFields, FieldSet, RateCatalog, RateCategory, Reading};

use crate::pipeline::PipelineError;

/// Standing charges are per day; readings are half-hourly.
pub const INTERVALS_PER_DAY: f64 = 48.0;

/// Pure cost derivation for one reading.
///
/// Values are left unrounded. When the catalog carries an agile table, an
/// interval missing from it (DST changeover) is priced at the resolved
/// flat/time-of-use rate.
pub fn compute_fields(
    reading: &Reading,
    category: RateCategory,
    catalog: &RateCatalog,
) -> Result<FieldSet, PipelineError> {
    let consumption = match catalog.conversion_factor() {
        Some(factor) => reading.consumption * factor,
        None => reading.consumption,
    };

    let rate = catalog.rate(category).ok_or_else(|| {
        PipelineError::Transform(format!(
            "{category} is not defined for the {} tariff",
            catalog.series()
        ))
    })?;
    let cost = consumption * rate;
    let total_cost = cost + catalog.standing_charge / INTERVALS_PER_DAY;

    let agile = catalog.agile().map(|agile| {
        let interval_start = reading.interval_start.with_timezone(&Utc);
        let agile_rate = agile.rate_at(interval_start).unwrap_or_else(|| {
            tracing::debug!(%interval_start, rate, "no agile rate for interval, using {category}");
            rate
        });
        let agile_cost = agile_rate * consumption;
        AgileFields {
            agile_rate,
            agile_cost,
            agile_total_cost: agile_cost + agile.standing_charge() / INTERVALS_PER_DAY,
        }
    });

    Ok(FieldSet {
        consumption,
        cost,
        total_cost,
        rate,
        agile,
    })
}
