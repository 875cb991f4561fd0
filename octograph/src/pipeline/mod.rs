use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use octograph_domain::domain::{Point, RateCatalog, Reading};

use crate::transform;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Config(String),
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Period requested from the metering API, `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

impl DateRange {
    pub fn period_from(&self) -> String {
        iso8601_utc(self.from)
    }

    pub fn period_to(&self) -> String {
        iso8601_utc(self.to)
    }
}

fn iso8601_utc(at: DateTime<FixedOffset>) -> String {
    at.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    async fn readings(&self, range: &DateRange) -> Result<Vec<Reading>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Writes one batch; called once per series.
    async fn write(&self, points: Vec<Point>) -> Result<(), PipelineError>;
}

/// Fetch, enrich and store one series.
pub struct Pipeline<S, K> {
    pub source: S,
    pub catalog: RateCatalog,
    pub account_name: Option<String>,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source,
    K: Sink,
{
    pub async fn run(self, range: &DateRange) -> Result<usize, PipelineError> {
        let series = self.catalog.series();
        tracing::info!(
            %series,
            from = %range.period_from(),
            to = %range.period_to(),
            "retrieving consumption"
        );

        let readings = self.source.readings(range).await?;
        tracing::info!(%series, readings = readings.len(), "retrieved consumption");

        let points = transform::assemble(
            series,
            self.account_name.as_deref(),
            &readings,
            &self.catalog,
        )?;
        let written = points.len();
        self.sink.write(points).await?;

        tracing::info!(%series, points = written, "stored series");
        Ok(written)
    }
}
