use std::time::Duration;

use octograph_domain::domain::Series;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::pipeline::{DateRange, PipelineError};

pub const DEFAULT_BASE_URL: &str = "https://api.octopus.energy/v1";

/// One page of an Octopus list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub results: Vec<Value>,
    pub next: Option<String>,
}

/// Fetches a single page of a paginated endpoint for a period.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        url: &Url,
        range: &DateRange,
        page: Option<&str>,
    ) -> Result<Page, PipelineError>;
}

/// Follow `next` links until exhausted, appending results in fetch order.
pub async fn fetch_all<T, F>(fetcher: &F, url: &Url, range: &DateRange) -> Result<Vec<T>, PipelineError>
where
    T: serde::de::DeserializeOwned,
    F: PageFetcher + ?Sized,
{
    let mut results = Vec::new();
    let mut page: Option<String> = None;

    loop {
        let Page { results: batch, next } = fetcher.fetch_page(url, range, page.as_deref()).await?;
        for value in batch {
            let record = serde_json::from_value(value)
                .map_err(|e| PipelineError::Source(format!("invalid record from {url}: {e}")))?;
            results.push(record);
        }

        match next.filter(|next| !next.is_empty()) {
            Some(next) => page = Some(next_page_token(&next)?),
            None => break,
        }
    }

    Ok(results)
}

/// Extract the `page` query parameter from a `next` link.
pub fn next_page_token(next: &str) -> Result<String, PipelineError> {
    let url = Url::parse(next)
        .map_err(|e| PipelineError::Source(format!("invalid next link '{next}': {e}")))?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| PipelineError::Source(format!("next link without page parameter: {next}")))
}

/// URL layout of the Octopus REST API.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn consumption(&self, series: Series, meter_point: &str, serial_number: &str) -> Result<Url, PipelineError> {
        self.parse(&format!(
            "{}/{series}-meter-points/{meter_point}/meters/{serial_number}/consumption/",
            self.base_url
        ))
    }

    pub fn standing_charges(&self, series: Series, product_code: &str, tariff_code: &str) -> Result<Url, PipelineError> {
        self.tariff_resource(series, product_code, tariff_code, "standing-charges")
    }

    pub fn standard_unit_rates(
        &self,
        series: Series,
        product_code: &str,
        tariff_code: &str,
    ) -> Result<Url, PipelineError> {
        self.tariff_resource(series, product_code, tariff_code, "standard-unit-rates")
    }

    fn tariff_resource(
        &self,
        series: Series,
        product_code: &str,
        tariff_code: &str,
        resource: &str,
    ) -> Result<Url, PipelineError> {
        self.parse(&format!(
            "{}/products/{product_code}/{series}-tariffs/{tariff_code}/{resource}/",
            self.base_url
        ))
    }

    fn parse(&self, url: &str) -> Result<Url, PipelineError> {
        Url::parse(url).map_err(|e| PipelineError::Config(format!("invalid Octopus API URL '{url}': {e}")))
    }
}

/// Authenticated HTTP client for the Octopus API.
pub struct OctopusClient {
    http: Client,
    api_key: String,
}

impl OctopusClient {
    pub fn new(api_key: &str) -> Result<Self, PipelineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Source(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for OctopusClient {
    async fn fetch_page(
        &self,
        url: &Url,
        range: &DateRange,
        page: Option<&str>,
    ) -> Result<Page, PipelineError> {
        let mut query = vec![("period_from", range.period_from()), ("period_to", range.period_to())];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }

        let response = self
            .http
            .get(url.clone())
            .query(&query)
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, %url, "Octopus API request failed");
                PipelineError::Source(e.to_string())
            })?;

        response
            .json::<Page>()
            .await
            .map_err(|e| PipelineError::Source(format!("invalid response from {url}: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned pages keyed by page token, recording every request.
    pub(crate) struct FakeFetcher {
        pages: Vec<(Option<&'static str>, Value)>,
        pub(crate) requests: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeFetcher {
        pub(crate) fn new(pages: Vec<(Option<&'static str>, Value)>) -> Self {
            Self {
                pages,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(
            &self,
            url: &Url,
            _range: &DateRange,
            page: Option<&str>,
        ) -> Result<Page, PipelineError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), page.map(str::to_string)));
            let body = self
                .pages
                .iter()
                .find(|(token, _)| *token == page)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| PipelineError::Source("404 Not Found".to_string()))?;
            serde_json::from_value(body).map_err(|e| PipelineError::Source(e.to_string()))
        }
    }

    pub(crate) fn range() -> DateRange {
        let utc = FixedOffset::east_opt(0).unwrap();
        DateRange {
            from: utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            to: utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Numbered {
        n: u32,
    }

    #[test]
    fn next_page_token_is_read_from_query() {
        let next = "https://api.octopus.energy/v1/electricity-meter-points/1/meters/2/consumption/?page=3&period_from=2023-01-01T00%3A00%3A00Z";
        assert_eq!(next_page_token(next).unwrap(), "3");
        assert!(next_page_token("https://api.octopus.energy/v1/?period_from=x").is_err());
        assert!(next_page_token("not a url").is_err());
    }

    #[tokio::test]
    async fn three_pages_are_concatenated_in_fetch_order() {
        let url = Url::parse("https://api.example.test/v1/consumption/").unwrap();
        let fetcher = FakeFetcher::new(vec![
            (
                None,
                json!({"results": [{"n": 1}, {"n": 2}], "next": "https://api.example.test/v1/consumption/?page=2"}),
            ),
            (
                Some("2"),
                json!({"results": [{"n": 3}], "next": "https://api.example.test/v1/consumption/?page=3"}),
            ),
            (Some("3"), json!({"results": [{"n": 4}, {"n": 5}, {"n": 6}], "next": null})),
        ]);

        let records: Vec<Numbered> = fetch_all(&fetcher, &url, &range()).await.unwrap();

        assert_eq!(records.len(), 6);
        let order: Vec<u32> = records.iter().map(|r| r.n).collect();
        assert_eq!(order, [1, 2, 3, 4, 5, 6]);

        let pages: Vec<Option<String>> = fetcher.requests.lock().unwrap().iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(pages, [None, Some("2".to_string()), Some("3".to_string())]);
    }

    #[tokio::test]
    async fn missing_results_and_empty_next_end_pagination() {
        let url = Url::parse("https://api.example.test/v1/consumption/").unwrap();
        let fetcher = FakeFetcher::new(vec![(None, json!({"next": ""}))]);

        let records: Vec<Numbered> = fetch_all(&fetcher, &url, &range()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn failing_page_aborts_the_whole_fetch() {
        let url = Url::parse("https://api.example.test/v1/consumption/").unwrap();
        let fetcher = FakeFetcher::new(vec![(
            None,
            json!({"results": [{"n": 1}], "next": "https://api.example.test/v1/consumption/?page=2"}),
        )]);

        let res: Result<Vec<Numbered>, _> = fetch_all(&fetcher, &url, &range()).await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }

    #[test]
    fn endpoints_follow_the_api_layout() {
        let endpoints = Endpoints::new("https://api.octopus.energy/v1/");

        assert_eq!(
            endpoints.consumption(Series::Gas, "123", "G4A").unwrap().as_str(),
            "https://api.octopus.energy/v1/gas-meter-points/123/meters/G4A/consumption/"
        );
        assert_eq!(
            endpoints
                .standing_charges(Series::Electricity, "AGILE-FLEX-22-11-25", "E-1R-AGILE-FLEX-22-11-25-C")
                .unwrap()
                .as_str(),
            "https://api.octopus.energy/v1/products/AGILE-FLEX-22-11-25/electricity-tariffs/E-1R-AGILE-FLEX-22-11-25-C/standing-charges/"
        );
        assert_eq!(
            endpoints
                .standard_unit_rates(Series::Gas, "VAR-22-10-01", "G-1R-VAR-22-10-01-C")
                .unwrap()
                .as_str(),
            "https://api.octopus.energy/v1/products/VAR-22-10-01/gas-tariffs/G-1R-VAR-22-10-01-C/standard-unit-rates/"
        );
    }
}
