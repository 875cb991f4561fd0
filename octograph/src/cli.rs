use std::{path::PathBuf, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::Parser;

use crate::pipeline::{DateRange, PipelineError};

/// Store Octopus Energy consumption, enriched with costs, in InfluxDB.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long = "config-file", env = "OCTOGRAPH_CONFIG", default_value = "octograph.toml")]
    pub config_file: PathBuf,

    /// Start of the period: `YYYY-MM-DD` (local midnight) or an RFC 3339 instant.
    /// Defaults to yesterday midnight.
    #[arg(long = "from-date")]
    pub from_date: Option<DateArg>,

    /// End of the period, exclusive. Defaults to today midnight.
    #[arg(long = "to-date")]
    pub to_date: Option<DateArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateArg {
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl FromStr for DateArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Day(day));
        }
        DateTime::parse_from_rfc3339(s)
            .map(Self::Instant)
            .map_err(|_| format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{s}'"))
    }
}

impl DateArg {
    /// Resolve against `zone`, or UTC when no zone is configured.
    pub fn resolve(self, zone: Option<Tz>) -> Result<DateTime<FixedOffset>, PipelineError> {
        match self {
            Self::Instant(at) => Ok(at),
            Self::Day(day) => local_midnight(day, zone),
        }
    }
}

fn local_midnight(day: NaiveDate, zone: Option<Tz>) -> Result<DateTime<FixedOffset>, PipelineError> {
    let naive = day.and_time(NaiveTime::MIN);
    match zone {
        None => Ok(Utc.from_utc_datetime(&naive).fixed_offset()),
        Some(zone) => zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|at| at.fixed_offset())
            .ok_or_else(|| PipelineError::Config(format!("midnight of {day} does not exist in {zone}"))),
    }
}

/// The run's period; defaults to the whole of yesterday in `zone`.
pub fn date_range(args: &Args, zone: Option<Tz>, now: DateTime<Utc>) -> Result<DateRange, PipelineError> {
    let today = match zone {
        Some(zone) => now.with_timezone(&zone).date_naive(),
        None => now.date_naive(),
    };
    let yesterday = today
        .pred_opt()
        .ok_or_else(|| PipelineError::Config(format!("no day before {today}")))?;

    let from = args.from_date.unwrap_or(DateArg::Day(yesterday)).resolve(zone)?;
    let to = args.to_date.unwrap_or(DateArg::Day(today)).resolve(zone)?;
    if from >= to {
        return Err(PipelineError::Config(format!("--from-date {from} is not before --to-date {to}")));
    }
    Ok(DateRange { from, to })
}
