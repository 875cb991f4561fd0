use chrono::{DateTime, FixedOffset};
use octograph_domain::domain::Reading;
use reqwest::Url;

use super::octopus::{fetch_all, PageFetcher};
use crate::pipeline::{DateRange, PipelineError, Source};

#[derive(serde::Deserialize)]
struct IncomingReading {
    consumption: f64,
    interval_start: DateTime<FixedOffset>,
    interval_end: DateTime<FixedOffset>,
}

impl From<IncomingReading> for Reading {
    fn from(i: IncomingReading) -> Self {
        Reading {
            interval_start: i.interval_start,
            interval_end: i.interval_end,
            consumption: i.consumption,
        }
    }
}

/// Half-hourly consumption of one meter, read from the Octopus API.
pub struct ConsumptionSource<'a, F: ?Sized> {
    fetcher: &'a F,
    url: Url,
}

impl<'a, F: PageFetcher + ?Sized> ConsumptionSource<'a, F> {
    pub fn new(fetcher: &'a F, url: Url) -> Self {
        Self { fetcher, url }
    }
}

#[async_trait::async_trait]
impl<'a, F> Source for ConsumptionSource<'a, F>
where
    F: PageFetcher + ?Sized,
{
    async fn readings(&self, range: &DateRange) -> Result<Vec<Reading>, PipelineError> {
        let incoming: Vec<IncomingReading> = fetch_all(self.fetcher, &self.url, range).await?;
        Ok(incoming.into_iter().map(Reading::from).collect())
    }
}
