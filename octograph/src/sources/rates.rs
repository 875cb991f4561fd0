use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use super::octopus::{fetch_all, Page, PageFetcher};
use crate::pipeline::{DateRange, PipelineError};

#[derive(Deserialize)]
struct Rate {
    value_inc_vat: f64,
}

#[derive(Deserialize)]
struct AgileRate {
    value_inc_vat: f64,
    valid_from: DateTime<Utc>,
}

/// `value_inc_vat` of the first rate published for the period.
pub async fn latest_value_inc_vat<F>(fetcher: &F, url: &Url, range: &DateRange) -> Result<f64, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let Page { results, .. } = fetcher.fetch_page(url, range, None).await?;
    let first = results
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::Source(format!("no rates published at {url} for the period")))?;
    let rate: Rate = serde_json::from_value(first)
        .map_err(|e| PipelineError::Source(format!("invalid rate from {url}: {e}")))?;
    Ok(rate.value_inc_vat)
}

/// Every half-hourly unit rate for the period, keyed by interval start.
pub async fn agile_unit_rates<F>(
    fetcher: &F,
    url: &Url,
    range: &DateRange,
) -> Result<Vec<(DateTime<Utc>, f64)>, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let rates: Vec<AgileRate> = fetch_all(fetcher, url, range).await?;
    Ok(rates
        .into_iter()
        .map(|rate| (rate.valid_from, rate.value_inc_vat))
        .collect())
}
